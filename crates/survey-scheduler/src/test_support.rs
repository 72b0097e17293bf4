//! Fakes shared by the unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use tokio::sync::mpsc;

use survey_core::{
    CampaignConfig, DismissCause, FetchError, FixedRandom, InMemoryLifecycleHub,
    InMemorySurveyStateRepository, ManualClock, PromptResponder, SessionFlag, StaticHostSignals,
    SurveyDefinition, SurveyDefinitionFetcher, SurveyEvent, SurveyEventEmitter, SurveyUiHost,
    UiError,
};

use crate::SurveyDeps;

pub const CAMPAIGN: &str = "abc";

mock! {
    pub Fetcher {}

    #[async_trait]
    impl SurveyDefinitionFetcher for Fetcher {
        async fn fetch(&self, campaign_id: &str) -> Result<SurveyDefinition, FetchError>;
        async fn is_expired(&self, campaign_id: &str) -> Result<bool, FetchError>;
    }
}

/// Fetcher that answers immediately with a definition that never expires.
pub fn ok_fetcher() -> MockFetcher {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .returning(|id| Ok(SurveyDefinition::new(id, format!("https://example.test/{id}"))));
    fetcher.expect_is_expired().returning(|_| Ok(false));
    fetcher
}

/// Fetcher whose calls never complete.
pub struct PendingFetcher;

#[async_trait]
impl SurveyDefinitionFetcher for PendingFetcher {
    async fn fetch(&self, _campaign_id: &str) -> Result<SurveyDefinition, FetchError> {
        std::future::pending().await
    }

    async fn is_expired(&self, _campaign_id: &str) -> Result<bool, FetchError> {
        std::future::pending().await
    }
}

#[derive(Clone, Default)]
pub struct RecordingEmitter {
    pub events: Arc<Mutex<Vec<SurveyEvent>>>,
}

impl RecordingEmitter {
    pub fn events(&self) -> Vec<SurveyEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SurveyEventEmitter for RecordingEmitter {
    fn emit(&self, event: SurveyEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn clone_box(&self) -> Box<dyn SurveyEventEmitter> {
        Box::new(self.clone())
    }
}

/// What the UI fake was asked to do.
#[derive(Debug)]
pub enum UiCall {
    Rendered(PromptResponder),
    Dismissed(DismissCause),
}

/// UI host that reports every call on a channel.
pub struct RecordingUi {
    calls: mpsc::UnboundedSender<UiCall>,
    pub fail_render: AtomicBool,
}

impl RecordingUi {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiCall>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (
            Self {
                calls,
                fail_render: AtomicBool::new(false),
            },
            rx,
        )
    }
}

impl SurveyUiHost for RecordingUi {
    fn render(
        &self,
        _config: &CampaignConfig,
        _definition: &SurveyDefinition,
        responder: PromptResponder,
    ) -> Result<(), UiError> {
        if self.fail_render.load(Ordering::SeqCst) {
            return Err(UiError::NoContainer);
        }
        let _ = self.calls.send(UiCall::Rendered(responder));
        Ok(())
    }

    fn dismiss(&self, _campaign_id: &str, cause: DismissCause) {
        let _ = self.calls.send(UiCall::Dismissed(cause));
    }
}

/// Everything a scheduler test needs, with handles kept for assertions.
pub struct Harness {
    pub repo: Arc<InMemorySurveyStateRepository>,
    pub hub: Arc<InMemoryLifecycleHub>,
    pub ui: Arc<RecordingUi>,
    pub ui_calls: mpsc::UnboundedReceiver<UiCall>,
    pub emitter: RecordingEmitter,
    pub session: SessionFlag,
    pub deps: SurveyDeps,
}

impl Harness {
    pub fn new(fetcher: Arc<dyn SurveyDefinitionFetcher>) -> Self {
        Self::with_host(fetcher, StaticHostSignals::eligible())
    }

    pub fn with_host(fetcher: Arc<dyn SurveyDefinitionFetcher>, host: StaticHostSignals) -> Self {
        let repo = Arc::new(InMemorySurveyStateRepository::new());
        let hub = Arc::new(InMemoryLifecycleHub::new());
        let (ui, ui_calls) = RecordingUi::new();
        let ui = Arc::new(ui);
        let emitter = RecordingEmitter::default();
        let session = SessionFlag::new();

        let deps = SurveyDeps {
            repo: repo.clone(),
            clock: Arc::new(ManualClock::new(5_000, 100)),
            random: Arc::new(FixedRandom::always_selects()),
            emitter: Arc::new(emitter.clone()),
            fetcher,
            ui: ui.clone(),
            pages: hub.clone(),
            host: Arc::new(host),
            session: session.clone(),
        };

        Self {
            repo,
            hub,
            ui,
            ui_calls,
            emitter,
            session,
            deps,
        }
    }

    /// Wait for the next UI call.
    pub async fn next_ui_call(&mut self) -> UiCall {
        tokio::time::timeout(Duration::from_secs(5), self.ui_calls.recv())
            .await
            .expect("timed out waiting for UI call")
            .expect("UI channel closed")
    }

    /// Wait for a render and return its responder.
    pub async fn expect_render(&mut self) -> PromptResponder {
        match self.next_ui_call().await {
            UiCall::Rendered(responder) => responder,
            UiCall::Dismissed(cause) => panic!("expected render, got dismiss({cause})"),
        }
    }

    /// Assert nothing reached the UI so far.
    pub fn assert_no_ui_call(&mut self) {
        if let Ok(call) = self.ui_calls.try_recv() {
            panic!("unexpected UI call: {call:?}");
        }
    }
}

/// Campaign that always passes sampling.
pub fn campaign() -> CampaignConfig {
    CampaignConfig::new(CAMPAIGN, 1.0, 0)
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
