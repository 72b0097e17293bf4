//! Download coordination.
//!
//! One call to [`DownloadCoordinator::try_start`] is one foreground
//! opportunity. The whole attempt runs on a spawned task:
//!
//! 1. Evaluate the eligibility gate (live consent and first-run signals)
//! 2. Count the download attempt, durably, before any network traffic. The
//!    count is claimed against the cap in the store itself, so controllers
//!    sharing a store cannot overshoot it
//! 3. Fetch the definition, racing the cancel token
//! 4. Hand the definition to a fresh [`PresentationScheduler`]
//!
//! Every failure ends the attempt quietly: nothing here is fatal to the
//! host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use survey_core::{
    CampaignConfig, CoreError, EligibilityGate, FetchError, GateDecision, GateSignals,
    SurveyEvent,
};

use crate::deps::SurveyDeps;
use crate::presentation::{PresentationOutcome, PresentationScheduler};
use crate::subscriptions::Subscriptions;

/// Identifier of one foreground attempt, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// How one attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The gate said no.
    Ineligible(GateDecision),
    /// Storage failed; treated as ineligible.
    StorageFailed,
    /// The definition download failed.
    FetchFailed(FetchError),
    /// Torn down before the presentation began.
    Cancelled,
    /// The presentation scheduler ran to completion.
    Presented(PresentationOutcome),
}

/// Subscriptions of schedulers that are currently running.
type LiveSubscriptions = Arc<Mutex<HashMap<AttemptId, Subscriptions>>>;

/// Starts download attempts for one campaign.
pub struct DownloadCoordinator {
    config: CampaignConfig,
    deps: SurveyDeps,
    gate: Arc<EligibilityGate>,
    force_enabled: bool,
    cancel: CancellationToken,
    live: LiveSubscriptions,
}

impl DownloadCoordinator {
    pub fn new(
        config: CampaignConfig,
        deps: SurveyDeps,
        force_enabled: bool,
        cancel: CancellationToken,
    ) -> Self {
        let gate = Arc::new(EligibilityGate::new(
            deps.repo.clone(),
            deps.clock.clone(),
            deps.random.clone(),
            deps.emitter.clone(),
        ));

        Self {
            config,
            deps,
            gate,
            force_enabled,
            cancel,
            live: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub const fn config(&self) -> &CampaignConfig {
        &self.config
    }

    /// Start one attempt on the current tokio runtime.
    ///
    /// Fails with [`CoreError::ExecutorRejected`] after shutdown or outside a
    /// runtime. Callers treat that exactly like an ineligible user.
    pub fn try_start(&self) -> Result<JoinHandle<AttemptOutcome>, CoreError> {
        if self.cancel.is_cancelled() {
            return Err(CoreError::ExecutorRejected(
                "coordinator has been shut down".to_string(),
            ));
        }
        let handle =
            Handle::try_current().map_err(|e| CoreError::ExecutorRejected(e.to_string()))?;

        let attempt = Attempt {
            id: AttemptId::new(),
            config: self.config.clone(),
            deps: self.deps.clone(),
            gate: self.gate.clone(),
            force_enabled: self.force_enabled,
            cancel: self.cancel.child_token(),
            live: self.live.clone(),
        };

        tracing::debug!(
            target: "survey.coordinator",
            campaign_id = %self.config.campaign_id(),
            attempt = %attempt.id,
            "Starting survey attempt"
        );

        Ok(handle.spawn(attempt.run()))
    }

    /// Cancel every attempt and drop all their subscriptions now.
    pub fn shutdown(&self) {
        self.cancel.cancel();

        let live: Vec<Subscriptions> = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for subs in live {
            subs.clear();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Everything one spawned attempt owns.
struct Attempt {
    id: AttemptId,
    config: CampaignConfig,
    deps: SurveyDeps,
    gate: Arc<EligibilityGate>,
    force_enabled: bool,
    cancel: CancellationToken,
    live: LiveSubscriptions,
}

/// Keeps a running scheduler's subscriptions reachable from `shutdown`.
///
/// The entry goes away with the guard, so an aborted attempt does not leave
/// it behind.
struct LiveEntry {
    id: AttemptId,
    live: LiveSubscriptions,
}

impl LiveEntry {
    fn register(id: AttemptId, live: &LiveSubscriptions, subscriptions: Subscriptions) -> Self {
        live.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, subscriptions);
        Self {
            id,
            live: live.clone(),
        }
    }
}

impl Drop for LiveEntry {
    fn drop(&mut self) {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl Attempt {
    async fn run(self) -> AttemptOutcome {
        let outcome = self.execute().await;
        tracing::debug!(
            target: "survey.coordinator",
            campaign_id = %self.config.campaign_id(),
            attempt = %self.id,
            ?outcome,
            "Survey attempt finished"
        );
        outcome
    }

    async fn execute(&self) -> AttemptOutcome {
        let campaign_id = self.config.campaign_id();

        if let Err(outcome) = self.admit().await {
            return outcome;
        }

        let fetched = tokio::select! {
            biased;

            () = self.cancel.cancelled() => return AttemptOutcome::Cancelled,

            result = self.deps.fetcher.fetch(campaign_id) => result,
        };

        let definition = match fetched {
            Ok(definition) => definition,
            Err(e) => {
                tracing::warn!(
                    target: "survey.coordinator",
                    campaign_id,
                    attempt = %self.id,
                    error = %e,
                    "Survey definition download failed"
                );
                self.deps
                    .emitter
                    .emit(SurveyEvent::download_failed(campaign_id, e.to_string()));
                return AttemptOutcome::FetchFailed(e);
            }
        };

        // A fetch that lost the race to teardown must not transition anything.
        if self.cancel.is_cancelled() {
            return AttemptOutcome::Cancelled;
        }

        let scheduler = PresentationScheduler::new(
            self.config.clone(),
            definition,
            self.deps.clone(),
            self.cancel.clone(),
        );
        let _entry = LiveEntry::register(self.id, &self.live, scheduler.subscriptions());

        AttemptOutcome::Presented(scheduler.run().await)
    }

    /// Gate and count the attempt. `Err` carries the final outcome.
    async fn admit(&self) -> Result<(), AttemptOutcome> {
        let campaign_id = self.config.campaign_id();
        if self.cancel.is_cancelled() {
            return Err(AttemptOutcome::Cancelled);
        }

        let signals = GateSignals {
            consent: self.deps.host.telemetry_consent(),
            is_first_run: self.deps.host.is_first_run(),
            force_enabled: self.force_enabled,
        };

        let decision = match self.gate.can_show(&self.config, signals).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(
                    target: "survey.coordinator",
                    campaign_id,
                    attempt = %self.id,
                    error = %e,
                    "Survey state unavailable, treating as ineligible"
                );
                return Err(AttemptOutcome::StorageFailed);
            }
        };
        if !decision.allowed {
            return Err(AttemptOutcome::Ineligible(decision));
        }

        // Counted before the fetch so the cap holds even if it never returns.
        // The force switch bypasses the cap, as it does in the gate.
        let cap = if self.force_enabled {
            0
        } else {
            self.config.max_download_attempts()
        };
        match self
            .deps
            .repo
            .try_increment_download_attempts(campaign_id, cap)
            .await
        {
            Ok(Some(attempts)) => {
                tracing::debug!(
                    target: "survey.coordinator",
                    campaign_id,
                    attempt = %self.id,
                    attempts,
                    "Download attempt recorded"
                );
                Ok(())
            }
            Ok(None) => {
                tracing::debug!(
                    target: "survey.coordinator",
                    campaign_id,
                    attempt = %self.id,
                    cap,
                    "Download cap taken by a concurrent attempt"
                );
                Err(AttemptOutcome::Ineligible(GateDecision::deny_silently()))
            }
            Err(e) => {
                tracing::warn!(
                    target: "survey.coordinator",
                    campaign_id,
                    attempt = %self.id,
                    error = %e,
                    "Failed to record download attempt, treating as ineligible"
                );
                Err(AttemptOutcome::StorageFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        CAMPAIGN, Harness, MockFetcher, PendingFetcher, campaign, ok_fetcher, settle,
    };
    use survey_core::{
        DismissOutcome, FilteringResult, PageId, PageSnapshot, StaticHostSignals,
        SurveyStateRepository,
    };

    fn coordinator(h: &Harness, force_enabled: bool) -> DownloadCoordinator {
        DownloadCoordinator::new(
            campaign(),
            h.deps.clone(),
            force_enabled,
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_selected_attempt_presents_and_counts() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));
        let coordinator = coordinator(&h, false);

        let task = coordinator.try_start().unwrap();
        h.expect_render().await.accept();

        assert_eq!(
            task.await.unwrap(),
            AttemptOutcome::Presented(PresentationOutcome::Dismissed(DismissOutcome::Accepted {
                attempts: 1
            }))
        );
        let state = h.repo.load(CAMPAIGN).await.unwrap();
        assert_eq!(state.download_attempts, 1);
        assert_eq!(state.last_sampled_day_of_year, Some(100));
    }

    #[tokio::test]
    async fn test_denied_gate_never_fetches() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().never();
        let h = Harness::with_host(
            Arc::new(fetcher),
            StaticHostSignals {
                consent: true,
                first_run: true,
            },
        );
        let coordinator = coordinator(&h, false);

        let outcome = coordinator.try_start().unwrap().await.unwrap();

        assert_eq!(
            outcome,
            AttemptOutcome::Ineligible(GateDecision::deny(FilteringResult::FirstRunUser))
        );
        assert_eq!(h.repo.load(CAMPAIGN).await.unwrap().download_attempts, 0);
    }

    #[tokio::test]
    async fn test_no_consent_is_silent() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().never();
        let h = Harness::with_host(
            Arc::new(fetcher),
            StaticHostSignals {
                consent: false,
                first_run: false,
            },
        );

        let outcome = coordinator(&h, true).try_start().unwrap().await.unwrap();

        assert_eq!(
            outcome,
            AttemptOutcome::Ineligible(GateDecision::deny_silently())
        );
        assert!(h.emitter.events().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_attempt_counted() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(FetchError::network("connection reset")));
        let mut h = Harness::new(Arc::new(fetcher));
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));

        let outcome = coordinator(&h, false).try_start().unwrap().await.unwrap();

        assert!(matches!(outcome, AttemptOutcome::FetchFailed(_)));
        assert_eq!(h.repo.load(CAMPAIGN).await.unwrap().download_attempts, 1);
        assert!(h.emitter.events().iter().any(|e| matches!(
            e,
            SurveyEvent::DownloadFailed { campaign_id, .. } if campaign_id == CAMPAIGN
        )));
        h.assert_no_ui_call();
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending_fetch() {
        let mut h = Harness::new(Arc::new(PendingFetcher));
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));
        let coordinator = coordinator(&h, false);

        let task = coordinator.try_start().unwrap();
        settle().await;
        coordinator.shutdown();

        assert_eq!(task.await.unwrap(), AttemptOutcome::Cancelled);
        // Counted before the network call.
        assert_eq!(h.repo.load(CAMPAIGN).await.unwrap().download_attempts, 1);
        h.assert_no_ui_call();
    }

    #[tokio::test]
    async fn test_shutdown_clears_subscriptions_synchronously() {
        let h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::loading(PageId(1))));
        let coordinator = coordinator(&h, false);

        let task = coordinator.try_start().unwrap();
        settle().await;
        assert_eq!(h.hub.subscription_count(), 2);

        coordinator.shutdown();
        assert_eq!(h.hub.subscription_count(), 0);

        assert_eq!(
            task.await.unwrap(),
            AttemptOutcome::Presented(PresentationOutcome::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_aborted_attempt_leaves_nothing_registered() {
        let h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::loading(PageId(1))));
        let coordinator = coordinator(&h, false);

        let task = coordinator.try_start().unwrap();
        settle().await;
        assert_eq!(coordinator.live.lock().unwrap().len(), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(coordinator.live.lock().unwrap().is_empty());
        assert_eq!(h.hub.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_try_start_after_shutdown_is_rejected() {
        let h = Harness::new(Arc::new(ok_fetcher()));
        let coordinator = coordinator(&h, false);
        coordinator.shutdown();

        assert!(matches!(
            coordinator.try_start(),
            Err(CoreError::ExecutorRejected(_))
        ));
        assert!(coordinator.is_shut_down());
    }

    #[test]
    fn test_try_start_outside_runtime_is_rejected() {
        let h = Harness::new(Arc::new(MockFetcher::new()));
        let coordinator = coordinator(&h, false);

        assert!(matches!(
            coordinator.try_start(),
            Err(CoreError::ExecutorRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_second_attempt_same_day_is_deduplicated() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        let coordinator = coordinator(&h, false);

        let first = coordinator.try_start().unwrap();
        let second = coordinator.try_start().unwrap();
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));
        h.expect_render().await.dismissed(survey_core::DismissCause::Timer);

        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        let deduplicated = AttemptOutcome::Ineligible(GateDecision::deny(
            FilteringResult::AlreadySampledToday,
        ));
        assert_eq!(
            outcomes.iter().filter(|o| **o == deduplicated).count(),
            1
        );
        assert_eq!(h.repo.load(CAMPAIGN).await.unwrap().download_attempts, 1);
    }
}
