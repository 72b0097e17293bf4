//! Fetch command handler.
//!
//! Downloads the definition for the configured campaign and asks whether it
//! has expired. A manual fetch does not count as a download attempt.

use std::fmt;

use survey_core::{SurveyDefinition, SurveyDefinitionFetcher};
use survey_remote::{DefaultSurveyFetcher, RemoteClientConfig};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Downloaded definition plus its expiry verdict.
pub struct FetchReport {
    pub definition: SurveyDefinition,
    pub expired: bool,
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let def = &self.definition;
        writeln!(f, "Campaign:   {}", def.campaign_id)?;
        if let Some(title) = &def.title {
            writeln!(f, "Title:      {title}")?;
        }
        writeln!(f, "Survey URL: {}", def.survey_url)?;
        match def.expires_at {
            Some(at) => writeln!(f, "Expires at: {}", at.to_rfc3339())?,
            None => writeln!(f, "Expires at: never")?,
        }
        write!(f, "Expired:    {}", if self.expired { "yes" } else { "no" })
    }
}

/// Fetch the definition of `campaign_id` through `fetcher`.
pub async fn fetch_with(
    fetcher: &dyn SurveyDefinitionFetcher,
    campaign_id: &str,
) -> Result<FetchReport, CliError> {
    let definition = fetcher.fetch(campaign_id).await?;
    let expired = fetcher.is_expired(campaign_id).await?;
    Ok(FetchReport {
        definition,
        expired,
    })
}

/// Execute the fetch command against the configured definition service.
pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let campaign = ctx.campaign()?;
    let config = RemoteClientConfig::new()
        .with_base_url(ctx.config.settings.effective_definition_base_url())
        .with_user_agent(concat!("survey-gate/", env!("CARGO_PKG_VERSION")));
    let fetcher = DefaultSurveyFetcher::new(&config)?;

    println!("{}", fetch_with(&fetcher, campaign.campaign_id()).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use survey_core::FetchError;

    struct ExpiredFetcher;

    #[async_trait]
    impl SurveyDefinitionFetcher for ExpiredFetcher {
        async fn fetch(&self, campaign_id: &str) -> Result<SurveyDefinition, FetchError> {
            let mut def = SurveyDefinition::new(campaign_id, "https://example.test/s");
            def.title = Some("Tell us".to_string());
            Ok(def)
        }

        async fn is_expired(&self, _campaign_id: &str) -> Result<bool, FetchError> {
            Ok(true)
        }
    }

    struct MissingFetcher;

    #[async_trait]
    impl SurveyDefinitionFetcher for MissingFetcher {
        async fn fetch(&self, campaign_id: &str) -> Result<SurveyDefinition, FetchError> {
            Err(FetchError::NotFound {
                campaign_id: campaign_id.to_string(),
            })
        }

        async fn is_expired(&self, _campaign_id: &str) -> Result<bool, FetchError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_report_shows_expiry() {
        let report = fetch_with(&ExpiredFetcher, "abc").await.unwrap();
        let text = report.to_string();
        assert!(text.contains("Title:      Tell us"));
        assert!(text.contains("Expires at: never"));
        assert!(text.ends_with("Expired:    yes"));
    }

    #[tokio::test]
    async fn test_missing_campaign_is_fetch_error() {
        let err = fetch_with(&MissingFetcher, "abc").await.err().unwrap();
        assert!(matches!(err, CliError::Fetch(FetchError::NotFound { .. })));
    }
}
