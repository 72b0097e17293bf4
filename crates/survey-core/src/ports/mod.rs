//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from the host
//! and from infrastructure. They contain no implementation details and use
//! only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` or `reqwest` types in any signature
//! - Storage ports are intent-based (increment, mark displayed), not generic CRUD
//! - Host-facing ports (`SurveyUiHost`, `PageLifecycleSource`) are synchronous;
//!   replies flow back through channels owned by the scheduler

pub mod clock;
pub mod definition_fetcher;
pub mod event_emitter;
pub mod host_signals;
pub mod page_lifecycle;
pub mod random;
pub mod survey_state;
pub mod ui_host;

use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use definition_fetcher::{FetchError, SurveyDefinitionFetcher};
pub use event_emitter::{NoopSurveyEmitter, SurveyEventEmitter, TracingSurveyEmitter};
pub use host_signals::{HostSignals, StaticHostSignals};
pub use page_lifecycle::{PageEventSender, PageLifecycleSource};
pub use random::{FixedRandom, RandomSource, ThreadRandom};
pub use survey_state::{InMemorySurveyStateRepository, SurveyStateRepository};
pub use ui_host::{PromptReply, PromptResponder, SurveyUiHost, UiError};

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and provides a clean interface for services to handle storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entry was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored value could not be interpreted.
    #[error("Corrupt value for {key}: {value}")]
    CorruptValue {
        /// Storage key holding the value.
        key: String,
        /// The offending raw value.
        value: i64,
    },
}

/// Core error type for semantic domain errors.
///
/// Nothing in this subsystem is fatal to the host: adapters log these and
/// degrade to "no survey shown".
#[derive(Debug, Error)]
pub enum CoreError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Definition fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The UI host refused to render.
    #[error(transparent)]
    Ui(#[from] UiError),

    /// Settings validation error.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// Background work could not be scheduled.
    #[error("Executor rejected task: {0}")]
    ExecutorRejected(String),
}
