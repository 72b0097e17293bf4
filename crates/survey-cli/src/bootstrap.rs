//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together for
//! the CLI: settings file plus overrides, the `SQLite` state store and the
//! clock. Command handlers receive the composed [`CliContext`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use survey_core::{
    CampaignConfig, Clock, EligibilityGate, ManualClock, RandomSource, SurveySettings,
    SurveyStateRepository, SystemClock, TracingSurveyEmitter, validate_settings,
};
use survey_db::StoreFactory;

use crate::error::CliError;
use crate::parser::Cli;

/// Directory under the platform data dir holding the default database.
const APP_DIR: &str = "survey-gate";

/// File name of the default database.
const DB_FILE: &str = "survey.db";

/// Resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Merged and validated settings.
    pub settings: SurveySettings,
    /// Settings file that was loaded, if any.
    pub settings_path: Option<PathBuf>,
    /// Location of the state database.
    pub db_path: PathBuf,
    /// Day-of-year override for the clock.
    pub day_override: Option<u32>,
}

impl CliConfig {
    /// Resolve the configuration from parsed arguments.
    ///
    /// Settings file values come first, command-line values win.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut settings = match &cli.config {
            Some(path) => load_settings(path)?,
            None => SurveySettings::default(),
        };
        settings.merge(&cli.settings_overrides());
        validate_settings(&settings)?;

        let db_path = match &cli.db {
            Some(path) => path.clone(),
            None => default_db_path()?,
        };

        Ok(Self {
            settings,
            settings_path: cli.config.clone(),
            db_path,
            day_override: cli.day,
        })
    }

    /// The campaign in effect, if a trigger id is configured.
    pub fn campaign(&self) -> Option<CampaignConfig> {
        self.settings.resolve_campaign()
    }
}

/// Read a JSON settings file.
pub fn load_settings(path: &Path) -> Result<SurveySettings, CliError> {
    let settings_error = |reason: String| CliError::SettingsFile {
        path: path.to_path_buf(),
        reason,
    };
    let raw = fs::read_to_string(path).map_err(|e| settings_error(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| settings_error(e.to_string()))
}

/// Default database location inside the platform's local data directory.
pub fn default_db_path() -> Result<PathBuf, CliError> {
    let data_dir = dirs::data_local_dir().ok_or(CliError::NoDataDir)?;
    Ok(data_dir.join(APP_DIR).join(DB_FILE))
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// Resolved configuration.
    pub config: CliConfig,
    /// Durable survey state.
    pub repo: Arc<dyn SurveyStateRepository>,
    /// Clock honoring the `--day` override.
    pub clock: Arc<dyn Clock>,
}

impl CliContext {
    /// The campaign commands operate on.
    pub fn campaign(&self) -> Result<CampaignConfig, CliError> {
        self.config.campaign().ok_or(CliError::NoCampaign)
    }

    /// Build an eligibility gate that logs its decisions through tracing.
    pub fn gate(&self, random: Arc<dyn RandomSource>) -> EligibilityGate {
        EligibilityGate::new(
            self.repo.clone(),
            self.clock.clone(),
            random,
            Arc::new(TracingSurveyEmitter),
        )
    }
}

/// Bootstrap the CLI context.
///
/// Opens (creating if needed) the state database at the configured path.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let repo = StoreFactory::open_survey_state(&config.db_path).await?;
    tracing::debug!(db_path = %config.db_path.display(), "Survey state store opened");

    let clock: Arc<dyn Clock> = match config.day_override {
        Some(day) => Arc::new(ManualClock::new(SystemClock.now_millis(), day)),
        None => Arc::new(SystemClock),
    };

    Ok(CliContext {
        config,
        repo,
        clock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use survey_core::SettingsError;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["survey-gate"];
        argv.extend_from_slice(args);
        argv.push("paths");
        Cli::parse_from(argv)
    }

    #[test]
    fn test_overrides_win_over_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"trigger_id": "from-file", "max_number": 4, "max_download_attempts": 2}"#,
        )
        .unwrap();

        let config = CliConfig::from_cli(&cli(&[
            "--config",
            path.to_str().unwrap(),
            "--db",
            "/tmp/x.db",
            "--max-number",
            "8",
        ]))
        .unwrap();

        let campaign = config.campaign().unwrap();
        assert_eq!(campaign.campaign_id(), "from-file");
        assert!((campaign.sample_probability() - 0.125).abs() < f64::EPSILON);
        assert_eq!(campaign.max_download_attempts(), 2);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let err = CliConfig::from_cli(&cli(&["--db", "/tmp/x.db", "--max-number", "0"]))
            .unwrap_err();
        assert!(matches!(err, CliError::Settings(SettingsError::ZeroMaxNumber)));
    }

    #[test]
    fn test_unreadable_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(CliError::SettingsFile { .. })
        ));
        assert!(matches!(
            load_settings(&dir.path().join("missing.json")),
            Err(CliError::SettingsFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_bootstrap_pins_day() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("survey.db");
        let config = CliConfig::from_cli(&cli(&[
            "--db",
            db.to_str().unwrap(),
            "--day",
            "200",
            "--trigger-id",
            "abc",
        ]))
        .unwrap();

        let ctx = bootstrap(config).await.unwrap();
        assert_eq!(ctx.clock.day_of_year(), 200);
        assert_eq!(ctx.campaign().unwrap().campaign_id(), "abc");
        assert!(db.exists());
    }
}
