//! Diagnostics events.
//!
//! Every admission decision and every prompt outcome is described by one
//! [`SurveyEvent`]. Events are emitted through
//! [`SurveyEventEmitter`](crate::ports::SurveyEventEmitter) and carry no
//! user-identifying data beyond the campaign id.
//!
//! # Wire Format
//!
//! ```json
//! { "type": "filtering", "campaignId": "abc", "result": "selected" }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{ClosingState, FilteringResult, PageId};

/// Largest bucket of the "download attempts before acceptance" histogram.
///
/// Larger counts are clamped into this bucket.
pub const MAX_ATTEMPTS_BUCKET: u32 = 20;

/// Diagnostics event emitted by the gate, the recorder and the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurveyEvent {
    /// The eligibility gate produced a decision with a reason code.
    Filtering {
        #[serde(rename = "campaignId")]
        campaign_id: String,
        result: FilteringResult,
    },

    /// A prompt was accepted after this many definition downloads.
    DownloadAttemptsBeforeAccepted {
        #[serde(rename = "campaignId")]
        campaign_id: String,
        /// Linear histogram bucket, clamped to [`MAX_ATTEMPTS_BUCKET`].
        bucket: u32,
    },

    /// A displayed prompt closed.
    PromptClosed {
        #[serde(rename = "campaignId")]
        campaign_id: String,
        state: ClosingState,
    },

    /// A prompt was rendered on a page.
    PromptShown {
        #[serde(rename = "campaignId")]
        campaign_id: String,
        page: PageId,
    },

    /// A prompt was ready but another survey was already shown this session.
    PromptSkipped {
        #[serde(rename = "campaignId")]
        campaign_id: String,
    },

    /// Fetching the survey definition failed.
    DownloadFailed {
        #[serde(rename = "campaignId")]
        campaign_id: String,
        error: String,
    },
}

impl SurveyEvent {
    /// Create a filtering event.
    pub fn filtering(campaign_id: impl Into<String>, result: FilteringResult) -> Self {
        Self::Filtering {
            campaign_id: campaign_id.into(),
            result,
        }
    }

    /// Create an acceptance sample, clamping `attempts` into the last bucket.
    pub fn attempts_before_accepted(campaign_id: impl Into<String>, attempts: u32) -> Self {
        Self::DownloadAttemptsBeforeAccepted {
            campaign_id: campaign_id.into(),
            bucket: attempts.min(MAX_ATTEMPTS_BUCKET),
        }
    }

    /// Create a prompt-closed event.
    pub fn prompt_closed(campaign_id: impl Into<String>, state: ClosingState) -> Self {
        Self::PromptClosed {
            campaign_id: campaign_id.into(),
            state,
        }
    }

    /// Create a download-failed event.
    pub fn download_failed(campaign_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::DownloadFailed {
            campaign_id: campaign_id.into(),
            error: error.into(),
        }
    }

    /// Campaign the event refers to.
    pub fn campaign_id(&self) -> &str {
        match self {
            Self::Filtering { campaign_id, .. }
            | Self::DownloadAttemptsBeforeAccepted { campaign_id, .. }
            | Self::PromptClosed { campaign_id, .. }
            | Self::PromptShown { campaign_id, .. }
            | Self::PromptSkipped { campaign_id }
            | Self::DownloadFailed { campaign_id, .. } => campaign_id,
        }
    }
}
