//! Persisted per-campaign survey state and its storage keys.

use serde::{Deserialize, Serialize};

/// Key of the day-of-year of the last sampling roll.
///
/// Not namespaced by campaign: one roll per day is shared by every campaign.
pub const LAST_SAMPLED_DAY_KEY: &str = "lastSampledDayOfYear";

/// Key of the prompt-displayed timestamp for a campaign.
pub fn prompt_displayed_key(campaign_id: &str) -> String {
    format!("promptDisplayedTimestamp::{campaign_id}")
}

/// Key of the download attempt counter for a campaign.
pub fn download_attempts_key(campaign_id: &str) -> String {
    format!("downloadAttempts::{campaign_id}")
}

/// Durable survey state as seen from one campaign.
///
/// `last_sampled_day_of_year` is the shared daily-roll slot; the other two
/// fields belong to the campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSurveyState {
    /// Day of year (1-366) of the last roll, `None` if never sampled.
    pub last_sampled_day_of_year: Option<u32>,
    /// Epoch millis when the prompt was displayed, `None` if never shown.
    pub prompt_displayed_at_millis: Option<i64>,
    /// Definition downloads started so far.
    pub download_attempts: u32,
}

impl PersistedSurveyState {
    /// Whether the one-shot display has been consumed.
    pub const fn was_displayed(&self) -> bool {
        self.prompt_displayed_at_millis.is_some()
    }
}
