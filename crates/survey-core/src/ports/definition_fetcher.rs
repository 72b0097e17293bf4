//! Remote survey definition port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SurveyDefinition;

/// Failure fetching a survey definition.
///
/// A failed fetch is transient from the product's point of view: it is
/// logged, the attempt counter stays consumed, and nothing is retried within
/// the same foreground opportunity.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FetchError {
    /// Network/HTTP error.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The survey service does not know this campaign.
    #[error("Campaign not found: {campaign_id}")]
    NotFound {
        /// The campaign that was requested.
        campaign_id: String,
    },

    /// The response could not be decoded.
    #[error("Invalid survey definition: {message}")]
    Decode {
        /// What was wrong with the payload.
        message: String,
    },
}

impl FetchError {
    /// Create a network error without a status code.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }
}

/// Port for downloading survey definitions.
///
/// The implementation lives in `survey-remote`; tests use mocks.
#[async_trait]
pub trait SurveyDefinitionFetcher: Send + Sync {
    /// Download the definition for `campaign_id`.
    async fn fetch(&self, campaign_id: &str) -> Result<SurveyDefinition, FetchError>;

    /// Whether the remote service reports the campaign as expired.
    async fn is_expired(&self, campaign_id: &str) -> Result<bool, FetchError>;
}
