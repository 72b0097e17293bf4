//! Core services.
//!
//! Services hold `Arc<dyn Port>` dependencies and contain the admission and
//! bookkeeping rules. They never spawn tasks; scheduling is the caller's job.

mod dismissal_recorder;
mod eligibility_gate;
mod lifecycle_hub;

pub use dismissal_recorder::{DismissOutcome, DismissalRecorder};
pub use eligibility_gate::{EligibilityGate, GateSignals};
pub use lifecycle_hub::InMemoryLifecycleHub;
