//! Composition utilities for building repositories with `SQLite` backends.
//!
//! This module is focused purely on construction and should not contain any
//! domain logic.

use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

use survey_core::SurveyStateRepository;

use crate::repositories::SqliteSurveyStateRepository;
use crate::setup::setup_database;

/// Factory for creating repository instances with `SQLite` backends.
pub struct StoreFactory;

impl StoreFactory {
    /// Open (or create) the database file at `db_path` with the full schema.
    pub async fn open(db_path: &Path) -> anyhow::Result<SqlitePool> {
        setup_database(db_path).await
    }

    /// Create a survey state repository from a pool.
    pub fn survey_state_repository(pool: SqlitePool) -> Arc<SqliteSurveyStateRepository> {
        Arc::new(SqliteSurveyStateRepository::new(pool))
    }

    /// Open the database at `db_path` and return the repository as a port.
    ///
    /// This is the recommended single-step way for adapters to obtain the
    /// durable survey state.
    pub async fn open_survey_state(
        db_path: &Path,
    ) -> anyhow::Result<Arc<dyn SurveyStateRepository>> {
        let pool = Self::open(db_path).await?;
        Ok(Self::survey_state_repository(pool))
    }
}

/// Test database helper for integration tests.
///
/// Provides an in-memory `SQLite` database with the production schema.
#[cfg(any(test, feature = "test-utils"))]
pub struct TestDb {
    pool: SqlitePool,
}

#[cfg(any(test, feature = "test-utils"))]
impl TestDb {
    /// Create a new in-memory test database.
    pub async fn new() -> anyhow::Result<Self> {
        let pool = crate::setup::setup_test_database().await?;
        Ok(Self { pool })
    }

    /// Get the underlying pool.
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a survey state repository using this test database.
    pub fn survey_state_repository(&self) -> SqliteSurveyStateRepository {
        SqliteSurveyStateRepository::new(self.pool.clone())
    }
}
