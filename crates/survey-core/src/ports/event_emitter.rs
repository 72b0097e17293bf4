//! Diagnostics event emitter port.
//!
//! This port abstracts diagnostics delivery, allowing the gate and the
//! scheduler to report outcomes without coupling to an analytics backend.

use crate::events::SurveyEvent;

/// Port for emitting survey diagnostics.
///
/// # Implementations
///
/// - `NoopSurveyEmitter` - For tests and contexts that drop diagnostics
/// - `TracingSurveyEmitter` - Writes every event to the `tracing` pipeline
/// - Host-specific implementations (histogram recorders, upload queues)
pub trait SurveyEventEmitter: Send + Sync {
    /// Emit a diagnostics event.
    ///
    /// This method should not block.
    fn emit(&self, event: SurveyEvent);

    /// Clone this emitter into a boxed trait object.
    ///
    /// This enables cloning of `Arc<dyn SurveyEventEmitter>` without
    /// requiring the underlying type to implement Clone.
    fn clone_box(&self) -> Box<dyn SurveyEventEmitter>;
}

/// A no-op emitter that discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopSurveyEmitter;

impl NoopSurveyEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl SurveyEventEmitter for NoopSurveyEmitter {
    fn emit(&self, _event: SurveyEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn SurveyEventEmitter> {
        Box::new(self.clone())
    }
}

/// Emitter that logs each event as structured JSON at `info`.
#[derive(Debug, Clone, Default)]
pub struct TracingSurveyEmitter;

impl SurveyEventEmitter for TracingSurveyEmitter {
    fn emit(&self, event: SurveyEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(
                target: "survey.diagnostics",
                campaign_id = %event.campaign_id(),
                %payload,
                "Survey event"
            ),
            Err(e) => tracing::warn!(
                target: "survey.diagnostics",
                error = %e,
                "Failed to serialize survey event"
            ),
        }
    }

    fn clone_box(&self) -> Box<dyn SurveyEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FilteringResult;
    use std::sync::Arc;

    #[test]
    fn test_noop_emitter() {
        let emitter = NoopSurveyEmitter::new();

        // Should not panic
        emitter.emit(SurveyEvent::filtering("abc", FilteringResult::Selected));
    }

    #[test]
    fn test_arc_emitter_clone_box() {
        let emitter: Arc<dyn SurveyEventEmitter> = Arc::new(TracingSurveyEmitter);
        let boxed = emitter.clone_box();
        boxed.emit(SurveyEvent::filtering("abc", FilteringResult::NonZeroRoll));
    }
}
