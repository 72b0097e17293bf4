//! Persisted survey state repository port.
//!
//! This port defines the interface for the durable per-campaign survey
//! state. Implementations must make every write durable before returning:
//! the once-per-day and one-shot guarantees depend on it surviving a crash
//! right after the call.
//!
//! # Design
//!
//! - Intent-based methods, not generic CRUD
//! - Fields are independent; last writer wins per field
//! - The displayed timestamp is write-once
//! - Claims (daily roll, capped attempt) are check-and-set in one step, so
//!   concurrent controllers sharing a store cannot both win

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{
    LAST_SAMPLED_DAY_KEY, PersistedSurveyState, download_attempts_key, prompt_displayed_key,
};

/// Port for the durable survey state.
///
/// Implemented by `survey-db` for production use and by
/// [`InMemorySurveyStateRepository`] for tests and dry runs.
#[async_trait]
pub trait SurveyStateRepository: Send + Sync {
    /// Load the state seen by `campaign_id`, including the shared roll day.
    async fn load(&self, campaign_id: &str) -> Result<PersistedSurveyState, RepositoryError>;

    /// Record that the daily roll happened on `day_of_year`.
    async fn record_sampled_day(&self, day_of_year: u32) -> Result<(), RepositoryError>;

    /// Claim today's roll.
    ///
    /// Stores `day_of_year` unless it is already the stored day. Returns
    /// `false` when someone else rolled today; nothing is written then.
    async fn try_claim_sampled_day(&self, day_of_year: u32) -> Result<bool, RepositoryError>;

    /// Add one download attempt for `campaign_id` and return the new count.
    async fn increment_download_attempts(&self, campaign_id: &str)
    -> Result<u32, RepositoryError>;

    /// Add one download attempt unless the count already reached `cap`.
    ///
    /// A `cap` of 0 means unlimited. Returns the new count, or `None` when
    /// the cap was reached and nothing was written.
    async fn try_increment_download_attempts(
        &self,
        campaign_id: &str,
        cap: u32,
    ) -> Result<Option<u32>, RepositoryError>;

    /// Record the prompt as displayed at `at_millis`.
    ///
    /// Returns `false` when a timestamp was already stored; the stored value
    /// is left untouched in that case.
    async fn mark_prompt_displayed(
        &self,
        campaign_id: &str,
        at_millis: i64,
    ) -> Result<bool, RepositoryError>;

    /// Remove every per-campaign value (debug/test only).
    async fn reset(&self, campaign_id: &str) -> Result<(), RepositoryError>;

    /// Clear the shared daily-roll slot (debug/test only).
    async fn reset_sampling(&self) -> Result<(), RepositoryError>;
}

/// Decode a stored day-of-year, rejecting values outside `1..=366`.
pub fn day_from_raw(raw: i64) -> Result<u32, RepositoryError> {
    u32::try_from(raw)
        .ok()
        .filter(|day| (1..=366).contains(day))
        .ok_or_else(|| RepositoryError::CorruptValue {
            key: LAST_SAMPLED_DAY_KEY.to_string(),
            value: raw,
        })
}

/// In-memory implementation of [`SurveyStateRepository`].
///
/// Uses the same logical keys as the durable stores. State is lost with the
/// process, so this is only suitable for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemorySurveyStateRepository {
    values: Mutex<HashMap<String, i64>>,
}

impl InMemorySurveyStateRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_values<T>(&self, f: impl FnOnce(&mut HashMap<String, i64>) -> T) -> T {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut values)
    }
}

#[async_trait]
impl SurveyStateRepository for InMemorySurveyStateRepository {
    async fn load(&self, campaign_id: &str) -> Result<PersistedSurveyState, RepositoryError> {
        let (day, displayed, attempts) = self.with_values(|values| {
            (
                values.get(LAST_SAMPLED_DAY_KEY).copied(),
                values.get(&prompt_displayed_key(campaign_id)).copied(),
                values.get(&download_attempts_key(campaign_id)).copied(),
            )
        });

        let download_attempts = match attempts {
            Some(raw) => u32::try_from(raw).map_err(|_| RepositoryError::CorruptValue {
                key: download_attempts_key(campaign_id),
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
        self.with_values(|values| {
            values.insert(LAST_SAMPLED_DAY_KEY.to_string(), i64::from(day_of_year));
        });
        Ok(())
    }

    async fn try_claim_sampled_day(&self, day_of_year: u32) -> Result<bool, RepositoryError> {
        let day = i64::from(day_of_year);
        Ok(self.with_values(|values| {
            if values.get(LAST_SAMPLED_DAY_KEY) == Some(&day) {
                false
            } else {
                values.insert(LAST_SAMPLED_DAY_KEY.to_string(), day);
                true
            }
        }))
    }

    async fn increment_download_attempts(
        &self,
        campaign_id: &str,
    ) -> Result<u32, RepositoryError> {
        self.try_increment_download_attempts(campaign_id, 0)
            .await
            .map(|count| count.unwrap_or_default())
    }

    async fn try_increment_download_attempts(
        &self,
        campaign_id: &str,
        cap: u32,
    ) -> Result<Option<u32>, RepositoryError> {
        let key = download_attempts_key(campaign_id);
        let raw = self.with_values(|values| {
            let entry = values.entry(key.clone()).or_insert(0);
            if cap > 0 && *entry >= i64::from(cap) {
                return None;
            }
            *entry += 1;
            Some(*entry)
        });
        raw.map(|value| {
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
        let key = prompt_displayed_key(campaign_id);
        Ok(self.with_values(|values| {
            if values.contains_key(&key) {
                false
            } else {
                values.insert(key, at_millis);
                true
            }
        }))
    }

    async fn reset(&self, campaign_id: &str) -> Result<(), RepositoryError> {
        self.with_values(|values| {
            values.remove(&prompt_displayed_key(campaign_id));
            values.remove(&download_attempts_key(campaign_id));
        });
        Ok(())
    }

    async fn reset_sampling(&self) -> Result<(), RepositoryError> {
        self.with_values(|values| {
            values.remove(LAST_SAMPLED_DAY_KEY);
        });
        Ok(())
    }
}
