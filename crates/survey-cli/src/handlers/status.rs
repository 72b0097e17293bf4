//! Status command handler.

use std::fmt;

use survey_core::{CampaignConfig, PersistedSurveyState};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Persisted state of one campaign, formatted for the terminal.
pub struct StatusReport {
    pub campaign: CampaignConfig,
    pub state: PersistedSurveyState,
}

impl StatusReport {
    /// Machine-readable form.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "campaign_id": self.campaign.campaign_id(),
            "last_sampled_day_of_year": self.state.last_sampled_day_of_year,
            "prompt_displayed_at_millis": self.state.prompt_displayed_at_millis,
            "download_attempts": self.state.download_attempts,
            "attempts_exhausted": self.campaign.attempts_exhausted(self.state.download_attempts),
        })
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Campaign:           {}", self.campaign.campaign_id())?;
        match self.state.last_sampled_day_of_year {
            Some(day) => writeln!(f, "Last sampled day:   {day}")?,
            None => writeln!(f, "Last sampled day:   never")?,
        }
        match self.state.prompt_displayed_at_millis {
            Some(at) => writeln!(f, "Prompt displayed:   at {at} ms")?,
            None => writeln!(f, "Prompt displayed:   no")?,
        }
        match self.campaign.max_download_attempts() {
            0 => write!(
                f,
                "Download attempts:  {} (unlimited)",
                self.state.download_attempts
            ),
            cap => write!(
                f,
                "Download attempts:  {} of {cap}",
                self.state.download_attempts
            ),
        }
    }
}

/// Load the state of the configured campaign.
pub async fn load(ctx: &CliContext) -> Result<StatusReport, CliError> {
    let campaign = ctx.campaign()?;
    let state = ctx.repo.load(campaign.campaign_id()).await?;
    Ok(StatusReport { campaign, state })
}

/// Execute the status command.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<(), CliError> {
    let report = load(ctx).await?;
    if json {
        println!("{:#}", report.to_json());
    } else {
        println!("{report}");
    }
    Ok(())
}
