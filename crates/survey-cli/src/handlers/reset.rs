//! Reset command handler.
//!
//! Debug/test only: forgets the campaign's displayed marker and download
//! counter, and optionally the shared daily roll.

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the reset command.
pub async fn execute(ctx: &CliContext, sampling: bool) -> Result<(), CliError> {
    let campaign = ctx.campaign()?;
    ctx.repo.reset(campaign.campaign_id()).await?;
    if sampling {
        ctx.repo.reset_sampling().await?;
    }
    tracing::info!(campaign_id = %campaign.campaign_id(), sampling, "Survey state reset");
    println!("Reset survey state for {}", campaign.campaign_id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{campaign_settings, context};
    use survey_core::{PersistedSurveyState, SurveyStateRepository};

    async fn seed(repo: &dyn SurveyStateRepository) {
        repo.record_sampled_day(10).await.unwrap();
        repo.increment_download_attempts("abc").await.unwrap();
        repo.mark_prompt_displayed("abc", 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_keeps_daily_roll() {
        let (ctx, repo) = context(campaign_settings());
        seed(repo.as_ref()).await;

        execute(&ctx, false).await.unwrap();
        let state = repo.load("abc").await.unwrap();
        assert_eq!(state.last_sampled_day_of_year, Some(10));
        assert!(!state.was_displayed());
        assert_eq!(state.download_attempts, 0);
    }

    #[tokio::test]
    async fn test_reset_with_sampling_clears_everything() {
        let (ctx, repo) = context(campaign_settings());
        seed(repo.as_ref()).await;

        execute(&ctx, true).await.unwrap();
        assert_eq!(
            repo.load("abc").await.unwrap(),
            PersistedSurveyState::default()
        );
    }
}
