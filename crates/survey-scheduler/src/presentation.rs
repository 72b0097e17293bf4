//! One-shot prompt presentation.
//!
//! A [`PresentationScheduler`] is a single-task actor. It owns its state and
//! receives everything it reacts to over channels: page lifecycle events
//! from the host and prompt replies from the UI. Nothing else mutates it, so
//! transitions never race each other.
//!
//! # States
//!
//! ```text
//! AwaitingPage -> AwaitingPageReady -> Displayed -> Terminal
//!       ^               |
//!       +---------------+  (active page went away)
//! ```
//!
//! - A page is ready when it is not loading and is interactable
//! - Hiding the watched page before it is ready abandons the attempt
//! - After display only the page's "hidden" event and the app "resume"
//!   event are watched
//! - Every path to `Terminal` removes every subscription

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use survey_core::{
    CampaignConfig, DismissCause, DismissOutcome, DismissalRecorder, LifecycleTopic, PageEvent,
    PageId, PageSnapshot, PromptReply, PromptResponder, SubscriptionId, SurveyDefinition,
    SurveyEvent,
};

use crate::deps::SurveyDeps;
use crate::subscriptions::Subscriptions;

/// Where a scheduler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationState {
    /// Waiting for the host to report a foreground page.
    AwaitingPage,
    /// Watching `page` until it is ready.
    AwaitingPageReady { page: PageId },
    /// The prompt is on screen on `page`.
    Displayed { page: PageId },
    /// Finished; all subscriptions are gone.
    Terminal,
}

/// How a presentation attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationOutcome {
    /// The prompt was shown and then dismissed.
    Dismissed(DismissOutcome),
    /// The watched page hid before it became ready.
    Abandoned,
    /// Another prompt was already shown this session.
    SkippedForSession,
    /// The UI host refused to render.
    RenderFailed,
    /// Torn down before anything was displayed.
    Cancelled,
    /// The dismissal could not be written to storage.
    RecordFailed,
}

/// Waits for the right moment to show one fetched survey, then books it.
///
/// Single-use: [`run`](Self::run) consumes the scheduler.
pub struct PresentationScheduler {
    config: CampaignConfig,
    definition: SurveyDefinition,
    deps: SurveyDeps,
    cancel: CancellationToken,
    state: PresentationState,
    subs: Subscriptions,
    /// Subscription on the page being watched while awaiting readiness.
    page_sub: Option<SubscriptionId>,
    page_tx: mpsc::UnboundedSender<PageEvent>,
    page_rx: mpsc::UnboundedReceiver<PageEvent>,
    reply_tx: mpsc::UnboundedSender<PromptReply>,
    reply_rx: mpsc::UnboundedReceiver<PromptReply>,
    recorder: DismissalRecorder,
}

impl PresentationScheduler {
    pub fn new(
        config: CampaignConfig,
        definition: SurveyDefinition,
        deps: SurveyDeps,
        cancel: CancellationToken,
    ) -> Self {
        let (page_tx, page_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let subs = Subscriptions::new(deps.pages.clone());
        let recorder = DismissalRecorder::new(
            config.campaign_id(),
            deps.repo.clone(),
            deps.clock.clone(),
            deps.emitter.clone(),
        );

        Self {
            config,
            definition,
            deps,
            cancel,
            state: PresentationState::AwaitingPage,
            subs,
            page_sub: None,
            page_tx,
            page_rx,
            reply_tx,
            reply_rx,
            recorder,
        }
    }

    pub const fn state(&self) -> PresentationState {
        self.state
    }

    /// Handle on this scheduler's subscriptions.
    pub fn subscriptions(&self) -> Subscriptions {
        self.subs.clone()
    }

    fn campaign_id(&self) -> &str {
        self.config.campaign_id()
    }

    /// Drive the attempt to completion.
    pub async fn run(mut self) -> PresentationOutcome {
        let outcome = self.drive().await;

        self.state = PresentationState::Terminal;
        self.subs.clear();

        tracing::debug!(
            target: "survey.presentation",
            campaign_id = %self.campaign_id(),
            ?outcome,
            "Presentation finished"
        );
        outcome
    }

    async fn drive(&mut self) -> PresentationOutcome {
        if let Some(outcome) = self.start() {
            return outcome;
        }

        loop {
            let step = tokio::select! {
                biased;

                () = self.cancel.cancelled() => Some(self.on_cancelled().await),

                Some(reply) = self.reply_rx.recv() => self.on_reply(reply).await,

                Some(event) = self.page_rx.recv() => self.on_page_event(event).await,

                else => Some(PresentationOutcome::Cancelled),
            };

            if let Some(outcome) = step {
                return outcome;
            }
        }
    }

    /// Enter `AwaitingPage`, moving on at once if a page is already tracked.
    fn start(&mut self) -> Option<PresentationOutcome> {
        self.subs
            .add(LifecycleTopic::ActivePage, self.page_tx.clone());
        self.state = PresentationState::AwaitingPage;

        self.deps
            .pages
            .active_page()
            .and_then(|snapshot| self.watch_page(snapshot))
    }

    /// Enter `AwaitingPageReady` for `snapshot`'s page.
    fn watch_page(&mut self, snapshot: PageSnapshot) -> Option<PresentationOutcome> {
        let page = snapshot.id;
        self.unwatch_page();
        self.page_sub = Some(self.subs.add(LifecycleTopic::Page(page), self.page_tx.clone()));
        self.state = PresentationState::AwaitingPageReady { page };

        tracing::debug!(
            target: "survey.presentation",
            campaign_id = %self.campaign_id(),
            %page,
            "Waiting for page to become ready"
        );

        // Re-read after subscribing: a change in between is either visible
        // here or already queued on the channel.
        self.display_if_ready(page)
    }

    fn unwatch_page(&mut self) {
        if let Some(id) = self.page_sub.take() {
            self.subs.remove(id);
        }
    }

    fn display_if_ready(&mut self, page: PageId) -> Option<PresentationOutcome> {
        let ready = self
            .deps
            .pages
            .active_page()
            .is_some_and(|s| s.id == page && s.is_ready());
        if ready { self.display(page) } else { None }
    }

    fn display(&mut self, page: PageId) -> Option<PresentationOutcome> {
        if !self.deps.session.try_claim() {
            tracing::info!(
                target: "survey.presentation",
                campaign_id = %self.campaign_id(),
                "Another survey was shown this session, skipping"
            );
            self.deps.emitter.emit(SurveyEvent::PromptSkipped {
                campaign_id: self.campaign_id().to_string(),
            });
            return Some(PresentationOutcome::SkippedForSession);
        }

        let responder = PromptResponder::new(self.reply_tx.clone());
        if let Err(e) = self
            .deps
            .ui
            .render(&self.config, &self.definition, responder)
        {
            self.deps.session.release();
            tracing::warn!(
                target: "survey.presentation",
                campaign_id = %self.campaign_id(),
                error = %e,
                "Failed to render survey prompt"
            );
            return Some(PresentationOutcome::RenderFailed);
        }

        // Readiness watching is over; only hide and resume matter now.
        self.page_sub = None;
        self.subs.clear();
        self.subs
            .add(LifecycleTopic::Page(page), self.page_tx.clone());
        self.subs.add(LifecycleTopic::App, self.page_tx.clone());
        self.state = PresentationState::Displayed { page };

        self.deps.emitter.emit(SurveyEvent::PromptShown {
            campaign_id: self.campaign_id().to_string(),
            page,
        });
        tracing::info!(
            target: "survey.presentation",
            campaign_id = %self.campaign_id(),
            %page,
            "Survey prompt displayed"
        );
        None
    }

    async fn on_page_event(&mut self, event: PageEvent) -> Option<PresentationOutcome> {
        use PresentationState::{AwaitingPage, AwaitingPageReady, Displayed};

        match (self.state, event) {
            (AwaitingPage, PageEvent::ActivePageChanged { page: Some(snapshot) }) => {
                self.watch_page(snapshot)
            }

            (AwaitingPageReady { page }, PageEvent::ActivePageChanged { page: next }) => {
                match next {
                    Some(snapshot) if snapshot.id == page => {
                        if snapshot.is_ready() {
                            self.display(page)
                        } else {
                            None
                        }
                    }
                    // Never display on a page the user already left.
                    Some(snapshot) => self.watch_page(snapshot),
                    None => {
                        self.unwatch_page();
                        self.state = AwaitingPage;
                        None
                    }
                }
            }

            (
                AwaitingPageReady { page },
                PageEvent::LoadFinished { page: p }
                | PageEvent::InteractabilityChanged { page: p, .. },
            ) if p == page => self.display_if_ready(page),

            (AwaitingPageReady { page }, PageEvent::Hidden { page: p }) if p == page => {
                tracing::debug!(
                    target: "survey.presentation",
                    campaign_id = %self.campaign_id(),
                    %page,
                    "Page hidden before it was ready, abandoning"
                );
                Some(PresentationOutcome::Abandoned)
            }

            (Displayed { page }, PageEvent::Hidden { page: p }) if p == page => {
                Some(self.dismiss_from_host(DismissCause::PageSwitched).await)
            }

            (Displayed { .. }, PageEvent::AppResumed) => self.check_expiry().await,

            _ => None,
        }
    }

    async fn on_reply(&mut self, reply: PromptReply) -> Option<PresentationOutcome> {
        if !matches!(self.state, PresentationState::Displayed { .. }) {
            return None;
        }

        let cause = match reply {
            PromptReply::Accepted => DismissCause::PrimaryAction,
            PromptReply::Dismissed(cause) => cause,
        };
        Some(self.record(cause).await)
    }

    async fn check_expiry(&mut self) -> Option<PresentationOutcome> {
        let expired = tokio::select! {
            biased;

            () = self.cancel.cancelled() => return Some(self.on_cancelled().await),

            result = self.deps.fetcher.is_expired(self.config.campaign_id()) => result,
        };

        match expired {
            Ok(true) => {
                tracing::info!(
                    target: "survey.presentation",
                    campaign_id = %self.campaign_id(),
                    "Campaign expired while displayed"
                );
                Some(self.dismiss_from_host(DismissCause::Other).await)
            }
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(
                    target: "survey.presentation",
                    campaign_id = %self.campaign_id(),
                    error = %e,
                    "Expiry check failed, keeping prompt"
                );
                None
            }
        }
    }

    async fn on_cancelled(&mut self) -> PresentationOutcome {
        if matches!(self.state, PresentationState::Displayed { .. }) {
            self.dismiss_from_host(DismissCause::ScopeDestroyed).await
        } else {
            PresentationOutcome::Cancelled
        }
    }

    /// Take the prompt down ourselves and book it.
    async fn dismiss_from_host(&mut self, cause: DismissCause) -> PresentationOutcome {
        self.deps.ui.dismiss(self.config.campaign_id(), cause);
        self.record(cause).await
    }

    async fn record(&mut self, cause: DismissCause) -> PresentationOutcome {
        match self.recorder.on_dismiss(cause).await {
            Ok(outcome) => PresentationOutcome::Dismissed(outcome),
            Err(e) => {
                tracing::warn!(
                    target: "survey.presentation",
                    campaign_id = %self.config.campaign_id(),
                    %cause,
                    error = %e,
                    "Failed to record dismissal"
                );
                PresentationOutcome::RecordFailed
            }
        }
    }
}

impl Drop for PresentationScheduler {
    fn drop(&mut self) {
        self.subs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CAMPAIGN, Harness, UiCall, campaign, ok_fetcher, settle};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use survey_core::{ClosingState, SurveyStateRepository};
    use tokio::task::JoinHandle;

    fn spawn(h: &Harness) -> (JoinHandle<PresentationOutcome>, CancellationToken) {
        let cancel = CancellationToken::new();
        let scheduler = PresentationScheduler::new(
            campaign(),
            SurveyDefinition::new(CAMPAIGN, "https://example.test/abc"),
            h.deps.clone(),
            cancel.clone(),
        );
        (tokio::spawn(scheduler.run()), cancel)
    }

    fn expiring_fetcher(expired: bool) -> crate::test_support::MockFetcher {
        let mut fetcher = crate::test_support::MockFetcher::new();
        fetcher.expect_fetch().never();
        fetcher
            .expect_is_expired()
            .times(1)
            .returning(move |_| Ok(expired));
        fetcher
    }

    #[tokio::test]
    async fn test_ready_page_displays_immediately() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));

        let (task, _cancel) = spawn(&h);
        let responder = h.expect_render().await;
        responder.accept();

        assert_eq!(
            task.await.unwrap(),
            PresentationOutcome::Dismissed(DismissOutcome::Accepted { attempts: 0 })
        );
        assert!(h.repo.load(CAMPAIGN).await.unwrap().was_displayed());
        assert!(h.session.is_set());
        assert_eq!(h.hub.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_waits_for_page_then_readiness() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        let (task, _cancel) = spawn(&h);
        settle().await;
        h.assert_no_ui_call();

        h.hub.set_active_page(Some(PageSnapshot::loading(PageId(1))));
        settle().await;
        h.assert_no_ui_call();

        h.hub.finish_loading(PageId(1));
        settle().await;
        h.assert_no_ui_call();

        h.hub.set_interactable(PageId(1), true);
        let responder = h.expect_render().await;
        responder.dismissed(DismissCause::Gesture);

        assert_eq!(
            task.await.unwrap(),
            PresentationOutcome::Dismissed(DismissOutcome::Displayed)
        );
        assert!(h.emitter.events().contains(&SurveyEvent::prompt_closed(
            CAMPAIGN,
            ClosingState::CloseButton
        )));
    }

    #[tokio::test]
    async fn test_page_switch_moves_watch_to_new_page() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::loading(PageId(1))));
        let (task, _cancel) = spawn(&h);
        settle().await;

        h.hub.set_active_page(Some(PageSnapshot::loading(PageId(2))));
        settle().await;

        // The old page becoming ready must not trigger a display.
        h.hub.finish_loading(PageId(1));
        h.hub.set_interactable(PageId(1), true);
        settle().await;
        h.assert_no_ui_call();
        assert!(!h.hub.is_subscribed(LifecycleTopic::Page(PageId(1))));

        h.hub.finish_loading(PageId(2));
        h.hub.set_interactable(PageId(2), true);
        let responder = h.expect_render().await;

        assert!(h.emitter.events().contains(&SurveyEvent::PromptShown {
            campaign_id: CAMPAIGN.to_string(),
            page: PageId(2),
        }));

        responder.dismissed(DismissCause::Timer);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_active_page_gone_returns_to_awaiting_page() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::loading(PageId(1))));
        let (task, _cancel) = spawn(&h);
        settle().await;

        h.hub.set_active_page(None);
        settle().await;
        assert!(!h.hub.is_subscribed(LifecycleTopic::Page(PageId(1))));
        assert!(h.hub.is_subscribed(LifecycleTopic::ActivePage));

        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(3))));
        h.expect_render().await.accept();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_hidden_before_ready_abandons() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::loading(PageId(1))));
        let (task, _cancel) = spawn(&h);
        settle().await;

        h.hub.hide(PageId(1));

        assert_eq!(task.await.unwrap(), PresentationOutcome::Abandoned);
        h.assert_no_ui_call();
        assert_eq!(h.hub.subscription_count(), 0);
        assert!(!h.session.is_set());
        assert!(!h.repo.load(CAMPAIGN).await.unwrap().was_displayed());

        // A page attached afterwards does not bring the attempt back.
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(2))));
        settle().await;
        h.assert_no_ui_call();
        assert_eq!(h.hub.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_session_flag_blocks_second_prompt() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        assert!(h.session.try_claim());
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));

        let (task, _cancel) = spawn(&h);

        assert_eq!(task.await.unwrap(), PresentationOutcome::SkippedForSession);
        h.assert_no_ui_call();
        assert!(h.emitter.events().contains(&SurveyEvent::PromptSkipped {
            campaign_id: CAMPAIGN.to_string()
        }));
    }

    #[tokio::test]
    async fn test_render_failure_releases_session() {
        let h = Harness::new(Arc::new(ok_fetcher()));
        h.ui.fail_render.store(true, Ordering::SeqCst);
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));

        let (task, _cancel) = spawn(&h);

        assert_eq!(task.await.unwrap(), PresentationOutcome::RenderFailed);
        assert!(!h.session.is_set());
        assert_eq!(h.hub.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_hidden_after_display_dismisses_as_page_switched() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));
        let (task, _cancel) = spawn(&h);
        let _responder = h.expect_render().await;

        h.hub.hide(PageId(1));

        assert!(matches!(
            h.next_ui_call().await,
            UiCall::Dismissed(DismissCause::PageSwitched)
        ));
        assert_eq!(
            task.await.unwrap(),
            PresentationOutcome::Dismissed(DismissOutcome::Displayed)
        );
        assert!(h.repo.load(CAMPAIGN).await.unwrap().was_displayed());
    }

    #[tokio::test]
    async fn test_resume_with_expired_campaign_dismisses() {
        let mut h = Harness::new(Arc::new(expiring_fetcher(true)));
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));
        let (task, _cancel) = spawn(&h);
        let _responder = h.expect_render().await;

        h.hub.resume_app();

        assert!(matches!(
            h.next_ui_call().await,
            UiCall::Dismissed(DismissCause::Other)
        ));
        assert_eq!(
            task.await.unwrap(),
            PresentationOutcome::Dismissed(DismissOutcome::Displayed)
        );
    }

    #[tokio::test]
    async fn test_resume_with_live_campaign_keeps_prompt() {
        let mut h = Harness::new(Arc::new(expiring_fetcher(false)));
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));
        let (task, _cancel) = spawn(&h);
        let responder = h.expect_render().await;

        h.hub.resume_app();
        settle().await;
        h.assert_no_ui_call();

        responder.dismissed(DismissCause::Gesture);
        assert_eq!(
            task.await.unwrap(),
            PresentationOutcome::Dismissed(DismissOutcome::Displayed)
        );
    }

    #[tokio::test]
    async fn test_cancel_while_displayed_is_scope_destroyed() {
        let mut h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::ready(PageId(1))));
        let (task, cancel) = spawn(&h);
        let responder = h.expect_render().await;

        cancel.cancel();

        assert!(matches!(
            h.next_ui_call().await,
            UiCall::Dismissed(DismissCause::ScopeDestroyed)
        ));
        assert_eq!(
            task.await.unwrap(),
            PresentationOutcome::Dismissed(DismissOutcome::NotRecorded)
        );
        assert!(!h.repo.load(CAMPAIGN).await.unwrap().was_displayed());
        assert_eq!(h.hub.subscription_count(), 0);

        // Late replies after teardown are dropped.
        responder.accept();
    }

    #[tokio::test]
    async fn test_cancel_before_display() {
        let h = Harness::new(Arc::new(ok_fetcher()));
        let (task, cancel) = spawn(&h);
        settle().await;
        assert_eq!(h.hub.subscription_count(), 1);

        cancel.cancel();

        assert_eq!(task.await.unwrap(), PresentationOutcome::Cancelled);
        assert_eq!(h.hub.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_scheduler_removes_subscriptions() {
        let h = Harness::new(Arc::new(ok_fetcher()));
        h.hub.set_active_page(Some(PageSnapshot::loading(PageId(1))));
        let (task, _cancel) = spawn(&h);
        settle().await;
        assert_eq!(h.hub.subscription_count(), 2);

        task.abort();
        let _ = task.await;

        assert_eq!(h.hub.subscription_count(), 0);
    }
}
