//! Composition root for one campaign.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use survey_core::{CampaignConfig, CoreError, SurveySettings, validate_settings};

use crate::coordinator::{AttemptOutcome, DownloadCoordinator};
use crate::deps::SurveyDeps;

/// Owns the survey flow for the configured campaign.
///
/// The host creates one controller per session scope, calls
/// [`on_foreground`](Self::on_foreground) whenever the app comes to the
/// foreground, and drops (or [`shutdown`](Self::shutdown)s) it when the
/// scope is torn down. Teardown cancels any in-flight download, removes
/// every lifecycle subscription and takes a displayed prompt down without
/// booking it as seen.
pub struct SurveyController {
    coordinator: DownloadCoordinator,
}

impl SurveyController {
    /// Build a controller from settings.
    ///
    /// Returns `Ok(None)` when no trigger id is configured: there is no
    /// campaign to run.
    pub fn from_settings(
        settings: &SurveySettings,
        deps: SurveyDeps,
    ) -> Result<Option<Self>, CoreError> {
        validate_settings(settings)?;

        let Some(config) = settings.resolve_campaign() else {
            tracing::debug!(target: "survey.controller", "No survey trigger id configured");
            return Ok(None);
        };

        tracing::info!(
            target: "survey.controller",
            campaign_id = %config.campaign_id(),
            sample_probability = config.sample_probability(),
            max_download_attempts = config.max_download_attempts(),
            force_enabled = settings.force_enabled,
            "Survey controller created"
        );

        Ok(Some(Self::new(config, deps, settings.force_enabled)))
    }

    pub fn new(config: CampaignConfig, deps: SurveyDeps, force_enabled: bool) -> Self {
        Self {
            coordinator: DownloadCoordinator::new(
                config,
                deps,
                force_enabled,
                CancellationToken::new(),
            ),
        }
    }

    pub const fn campaign(&self) -> &CampaignConfig {
        self.coordinator.config()
    }

    /// Give the campaign one chance for this foreground opportunity.
    ///
    /// Returns `None` when the attempt could not be scheduled; that is
    /// logged and otherwise treated as "not eligible".
    pub fn on_foreground(&self) -> Option<JoinHandle<AttemptOutcome>> {
        match self.coordinator.try_start() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(
                    target: "survey.controller",
                    campaign_id = %self.campaign().campaign_id(),
                    error = %e,
                    "Survey attempt rejected"
                );
                None
            }
        }
    }

    /// Tear down every attempt of this controller.
    pub fn shutdown(&self) {
        if !self.coordinator.is_shut_down() {
            tracing::debug!(
                target: "survey.controller",
                campaign_id = %self.campaign().campaign_id(),
                "Shutting down survey controller"
            );
        }
        self.coordinator.shutdown();
    }
}

impl Drop for SurveyController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
