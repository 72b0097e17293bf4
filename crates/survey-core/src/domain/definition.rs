//! Remote survey definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A survey definition fetched from the remote survey service.
///
/// The scheduler never looks inside beyond the campaign id and expiry; the
/// UI host decides how to present it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDefinition {
    /// Trigger id this definition belongs to.
    pub campaign_id: String,
    /// Short invitation text shown in the prompt.
    #[serde(default)]
    pub title: Option<String>,
    /// Where the survey itself lives once the user accepts.
    pub survey_url: String,
    /// When the campaign stops accepting responses.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SurveyDefinition {
    /// Create a definition with no title and no expiry.
    pub fn new(campaign_id: impl Into<String>, survey_url: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            title: None,
            survey_url: survey_url.into(),
            expires_at: None,
        }
    }

    /// Whether the campaign has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}
