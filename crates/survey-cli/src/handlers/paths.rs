//! Paths command handler.
//!
//! Shows where state lives and which campaign the settings resolve to,
//! without opening the database.

use std::fmt;

use crate::bootstrap::CliConfig;

/// Resolved locations and campaign, in `key = value` lines.
pub struct PathsReport<'a>(pub &'a CliConfig);

impl fmt::Display for PathsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.0;
        writeln!(f, "database = {}", config.db_path.display())?;
        match &config.settings_path {
            Some(path) => writeln!(f, "settings = {}", path.display())?,
            None => writeln!(f, "settings = (none)")?,
        }
        writeln!(
            f,
            "definition_base_url = {}",
            config.settings.effective_definition_base_url()
        )?;
        match config.campaign() {
            Some(campaign) => {
                writeln!(f, "campaign = {}", campaign.campaign_id())?;
                writeln!(f, "sample_probability = {}", campaign.sample_probability())?;
                writeln!(
                    f,
                    "max_download_attempts = {}",
                    campaign.max_download_attempts()
                )?;
                write!(f, "force_enabled = {}", config.settings.force_enabled)
            }
            None => write!(f, "campaign = (none)"),
        }
    }
}

/// Execute the paths command.
pub fn execute(config: &CliConfig) {
    println!("{}", PathsReport(config));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use survey_core::SurveySettings;

    #[test]
    fn test_report_without_campaign() {
        let config = CliConfig {
            settings: SurveySettings::default(),
            settings_path: None,
            db_path: PathBuf::from("/data/survey.db"),
            day_override: None,
        };
        let report = PathsReport(&config).to_string();
        assert!(report.contains("database = /data/survey.db"));
        assert!(report.ends_with("campaign = (none)"));
    }

    #[test]
    fn test_report_with_campaign() {
        let config = CliConfig {
            settings: SurveySettings {
                trigger_id: Some("abc".to_string()),
                max_number: Some(2),
                ..Default::default()
            },
            settings_path: Some(PathBuf::from("/etc/survey.json")),
            db_path: PathBuf::from("/data/survey.db"),
            day_override: None,
        };
        let report = PathsReport(&config).to_string();
        assert!(report.contains("settings = /etc/survey.json"));
        assert!(report.contains("campaign = abc"));
        assert!(report.contains("sample_probability = 0.5"));
    }
}
