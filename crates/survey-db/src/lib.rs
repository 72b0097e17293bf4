//! `SQLite` persistence for survey-gate.
//!
//! Implements the `SurveyStateRepository` port from `survey-core` on top of a
//! single key/value table. Every write is committed before the call returns.
#![deny(unsafe_code)]

pub mod factory;
pub mod repositories;
pub mod setup;

// Linked for its bundled SQLite build only
use libsqlite3_sys as _;

// Re-export factory for convenient access
pub use factory::StoreFactory;

// Re-export TestDb for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub use factory::TestDb;

pub use repositories::SqliteSurveyStateRepository;

// Re-export setup functions for convenient access
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
