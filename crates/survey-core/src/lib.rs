//! Core domain for survey-gate.
//!
//! This crate owns everything that decides *whether* a survey invitation may
//! be shown and how a dismissal is booked, without knowing how state is
//! stored, how definitions are fetched or how a prompt is drawn.
//!
//! - `domain` - campaign, persisted state, admission and dismissal types
//! - `ports` - trait abstractions implemented by adapters
//! - `services` - the eligibility gate and the dismissal recorder
//! - `events` - diagnostics events emitted through the emitter port
//! - `settings` - operator/experiment configuration and validation
//! - `session` - the process-wide "already shown this session" flag
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod services;
pub mod session;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    CampaignConfig, ClosingState, DismissCause, FilteringResult, GateDecision, LifecycleTopic,
    PageEvent, PageId, PageSnapshot, PersistedSurveyState, SubscriptionId, SurveyDefinition,
};
pub use events::{MAX_ATTEMPTS_BUCKET, SurveyEvent};
pub use ports::{
    Clock, CoreError, FetchError, FixedRandom, HostSignals, InMemorySurveyStateRepository,
    ManualClock, NoopSurveyEmitter, PageEventSender, PageLifecycleSource, PromptReply,
    PromptResponder, RandomSource, RepositoryError, StaticHostSignals, SurveyDefinitionFetcher,
    SurveyEventEmitter, SurveyStateRepository, SurveyUiHost, SystemClock, ThreadRandom,
    TracingSurveyEmitter, UiError,
};
pub use services::{
    DismissOutcome, DismissalRecorder, EligibilityGate, GateSignals, InMemoryLifecycleHub,
};
pub use session::SessionFlag;
pub use settings::{SettingsError, SurveySettings, validate_settings};

// Silence unused dev-dependency warnings for crates only some tests use
#[cfg(test)]
use tokio_test as _;
