//! Scheduling half of survey-gate.
//!
//! - [`DownloadCoordinator`] runs the eligibility gate and the definition
//!   download on a background task, once per foreground opportunity
//! - [`PresentationScheduler`] waits for a ready page and shows the prompt
//!   exactly once
//! - [`SurveyController`] wires both to the host and owns teardown
#![deny(unused_crate_dependencies)]

mod controller;
mod coordinator;
mod deps;
mod presentation;
mod subscriptions;

#[cfg(test)]
mod test_support;

pub use controller::SurveyController;
pub use coordinator::{AttemptId, AttemptOutcome, DownloadCoordinator};
pub use deps::SurveyDeps;
pub use presentation::{PresentationOutcome, PresentationScheduler, PresentationState};
pub use subscriptions::Subscriptions;

// Used by integration tests only
#[cfg(test)]
use survey_db as _;
