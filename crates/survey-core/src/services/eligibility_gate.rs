//! Eligibility gate: decides whether this install may be approached for a
//! campaign.
//!
//! # Check order
//!
//! Checks short-circuit and their order matters, because the sampling step
//! writes state:
//!
//! 1. No telemetry consent: deny, record nothing
//! 2. Force switch: allow (`ForceEnabled`), unless already displayed
//! 3. First run: deny (`FirstRunUser`)
//! 4. Already displayed: deny (`AlreadyDisplayed`)
//! 5. Download cap reached: deny, no reason code
//! 6. Daily sampling: `AlreadySampledToday`, else claim today's roll day
//!    (atomically in the store), then `ProbabilityMissing`, `Selected` or
//!    `NonZeroRoll`

use std::sync::Arc;

use crate::domain::{CampaignConfig, FilteringResult, GateDecision, PersistedSurveyState};
use crate::events::SurveyEvent;
use crate::ports::{Clock, RandomSource, RepositoryError, SurveyEventEmitter, SurveyStateRepository};

/// Live signals for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSignals {
    /// Telemetry / crash upload permitted.
    pub consent: bool,
    /// The install is in its first run.
    pub is_first_run: bool,
    /// Operator/debug force switch.
    pub force_enabled: bool,
}

/// Admission control over persisted survey state.
pub struct EligibilityGate {
    repo: Arc<dyn SurveyStateRepository>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    emitter: Arc<dyn SurveyEventEmitter>,
}

impl EligibilityGate {
    /// Create a gate over the given ports.
    pub fn new(
        repo: Arc<dyn SurveyStateRepository>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        emitter: Arc<dyn SurveyEventEmitter>,
    ) -> Self {
        Self {
            repo,
            clock,
            random,
            emitter,
        }
    }

    /// Evaluate whether the survey for `config` may be downloaded and shown.
    ///
    /// Emits one `Filtering` event per decision that carries a reason.
    /// The only write is the shared roll day, and only when a roll happens.
    pub async fn can_show(
        &self,
        config: &CampaignConfig,
        signals: GateSignals,
    ) -> Result<GateDecision, RepositoryError> {
        if !signals.consent {
            // Privacy: do not even log an attempt.
            return Ok(GateDecision::deny_silently());
        }

        let decision = self.evaluate(config, signals).await?;

        tracing::debug!(
            target: "survey.gate",
            campaign_id = %config.campaign_id(),
            allowed = decision.allowed,
            reason = ?decision.reason,
            "Eligibility evaluated"
        );

        if let Some(reason) = decision.reason {
            self.emitter
                .emit(SurveyEvent::filtering(config.campaign_id(), reason));
        }

        Ok(decision)
    }

    async fn evaluate(
        &self,
        config: &CampaignConfig,
        signals: GateSignals,
    ) -> Result<GateDecision, RepositoryError> {
        let state = self.repo.load(config.campaign_id()).await?;

        if signals.force_enabled {
            // The one-shot display outranks the operator override.
            if state.was_displayed() {
                return Ok(GateDecision::deny(FilteringResult::AlreadyDisplayed));
            }
            return Ok(GateDecision::allow(FilteringResult::ForceEnabled));
        }

        if signals.is_first_run {
            return Ok(GateDecision::deny(FilteringResult::FirstRunUser));
        }

        if state.was_displayed() {
            return Ok(GateDecision::deny(FilteringResult::AlreadyDisplayed));
        }

        if config.attempts_exhausted(state.download_attempts) {
            tracing::debug!(
                target: "survey.gate",
                campaign_id = %config.campaign_id(),
                attempts = state.download_attempts,
                cap = config.max_download_attempts(),
                "Download attempts exhausted"
            );
            return Ok(GateDecision::deny_silently());
        }

        self.sample_today(config, &state).await
    }

    async fn sample_today(
        &self,
        config: &CampaignConfig,
        state: &PersistedSurveyState,
    ) -> Result<GateDecision, RepositoryError> {
        let today = self.clock.day_of_year();
        if state.last_sampled_day_of_year == Some(today) {
            return Ok(GateDecision::deny(FilteringResult::AlreadySampledToday));
        }

        // Persist before rolling so a crash never re-rolls the same day.
        // Losing the claim means a concurrent evaluation rolled today.
        if !self.repo.try_claim_sampled_day(today).await? {
            return Ok(GateDecision::deny(FilteringResult::AlreadySampledToday));
        }

        let probability = config.sample_probability();
        if probability <= 0.0 {
            return Ok(GateDecision::deny(FilteringResult::ProbabilityMissing));
        }

        if self.random.next_unit() <= probability {
            Ok(GateDecision::allow(FilteringResult::Selected))
        } else {
            Ok(GateDecision::deny(FilteringResult::NonZeroRoll))
        }
    }
}
