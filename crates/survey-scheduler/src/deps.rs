//! Injected collaborators.

use std::sync::Arc;

use survey_core::{
    Clock, HostSignals, PageLifecycleSource, RandomSource, SessionFlag, SurveyDefinitionFetcher,
    SurveyEventEmitter, SurveyStateRepository, SurveyUiHost,
};

/// Dependencies shared by the coordinator and the schedulers it starts.
///
/// These are cloned Arc references to ports, so each attempt task operates
/// independently of the controller that spawned it.
#[derive(Clone)]
pub struct SurveyDeps {
    /// Durable per-campaign state.
    pub repo: Arc<dyn SurveyStateRepository>,
    /// Wall clock for the daily roll and the displayed timestamp.
    pub clock: Arc<dyn Clock>,
    /// Uniform random source for the daily roll.
    pub random: Arc<dyn RandomSource>,
    /// Diagnostics sink.
    pub emitter: Arc<dyn SurveyEventEmitter>,
    /// Remote definition service.
    pub fetcher: Arc<dyn SurveyDefinitionFetcher>,
    /// Prompt renderer.
    pub ui: Arc<dyn SurveyUiHost>,
    /// Foreground page tracker.
    pub pages: Arc<dyn PageLifecycleSource>,
    /// Consent and first-run signals.
    pub host: Arc<dyn HostSignals>,
    /// Process-wide "prompt shown this session" flag.
    pub session: SessionFlag,
}
