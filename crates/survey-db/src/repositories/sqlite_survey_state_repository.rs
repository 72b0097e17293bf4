//! `SQLite` implementation of the `SurveyStateRepository` trait.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use survey_core::domain::{LAST_SAMPLED_DAY_KEY, download_attempts_key, prompt_displayed_key};
use survey_core::ports::survey_state::day_from_raw;
use survey_core::{PersistedSurveyState, RepositoryError, SurveyStateRepository};

/// `SQLite` implementation of the `SurveyStateRepository` trait.
///
/// Each logical value is one row of `survey_kv`. Counter and write-once
/// semantics are enforced in SQL, so concurrent writers on the same file
/// cannot lose an increment or overwrite the displayed timestamp.
pub struct SqliteSurveyStateRepository {
    pool: SqlitePool,
}

impl SqliteSurveyStateRepository {
    /// Create a new `SQLite` survey state repository.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read a raw value by key.
    async fn get(&self, key: &str) -> Result<Option<i64>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM survey_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        Ok(row.map(|r| r.get::<i64, _>("value")))
    }
}

fn storage(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

fn now_text() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[async_trait]
impl SurveyStateRepository for SqliteSurveyStateRepository {
    async fn load(&self, campaign_id: &str) -> Result<PersistedSurveyState, RepositoryError> {
        let attempts_key = download_attempts_key(campaign_id);

        let day = self.get(LAST_SAMPLED_DAY_KEY).await?;
        let displayed = self.get(&prompt_displayed_key(campaign_id)).await?;
        let attempts = self.get(&attempts_key).await?;

        let download_attempts = match attempts {
            Some(raw) => u32::try_from(raw).map_err(|_| RepositoryError::CorruptValue {
                key: attempts_key,
                value: raw,
            })?,
            None => 0,
        };

        Ok(PersistedSurveyState {
            last_sampled_day_of_year: day.map(day_from_raw).transpose()?,
            prompt_displayed_at_millis: displayed,
            download_attempts,
        })
    }

    async fn record_sampled_day(&self, day_of_year: u32) -> Result<(), RepositoryError> {
        sqlx::query("INSERT OR REPLACE INTO survey_kv (key, value, updated_at) VALUES (?, ?, ?)")
            .bind(LAST_SAMPLED_DAY_KEY)
            .bind(i64::from(day_of_year))
            .bind(now_text())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(())
    }

    async fn try_claim_sampled_day(&self, day_of_year: u32) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO survey_kv (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            WHERE survey_kv.value != excluded.value
            "#,
        )
        .bind(LAST_SAMPLED_DAY_KEY)
        .bind(i64::from(day_of_year))
        .bind(now_text())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_download_attempts(
        &self,
        campaign_id: &str,
    ) -> Result<u32, RepositoryError> {
        let key = download_attempts_key(campaign_id);
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO survey_kv (key, value, updated_at) VALUES (?, 1, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = survey_kv.value + 1,
                updated_at = excluded.updated_at
            RETURNING value
            "#,
        )
        .bind(&key)
        .bind(now_text())
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;

        u32::try_from(value).map_err(|_| RepositoryError::CorruptValue { key, value })
    }

    async fn try_increment_download_attempts(
        &self,
        campaign_id: &str,
        cap: u32,
    ) -> Result<Option<u32>, RepositoryError> {
        let key = download_attempts_key(campaign_id);
        let cap = i64::from(cap);
        // No row comes back when the conditional update is skipped.
        let value: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO survey_kv (key, value, updated_at) VALUES (?, 1, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = survey_kv.value + 1,
                updated_at = excluded.updated_at
            WHERE ? = 0 OR survey_kv.value < ?
            RETURNING value
            "#,
        )
        .bind(&key)
        .bind(now_text())
        .bind(cap)
        .bind(cap)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        value
            .map(|value| {
                u32::try_from(value).map_err(|_| RepositoryError::CorruptValue {
                    key: key.clone(),
                    value,
                })
            })
            .transpose()
    }

    async fn mark_prompt_displayed(
        &self,
        campaign_id: &str,
        at_millis: i64,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO survey_kv (key, value, updated_at) VALUES (?, ?, ?)")
                .bind(prompt_displayed_key(campaign_id))
                .bind(at_millis)
                .bind(now_text())
                .execute(&self.pool)
                .await
                .map_err(storage)?;

        Ok(result.rows_affected() == 1)
    }

    async fn reset(&self, campaign_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM survey_kv WHERE key IN (?, ?)")
            .bind(prompt_displayed_key(campaign_id))
            .bind(download_attempts_key(campaign_id))
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        tracing::info!(target: "survey.db", campaign_id, "Campaign state reset");
        Ok(())
    }

    async fn reset_sampling(&self) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM survey_kv WHERE key = ?")
            .bind(LAST_SAMPLED_DAY_KEY)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(())
    }
}
