//! Internal error types for definition service calls.
//!
//! These errors are internal to `survey-remote` and are mapped to the core
//! `FetchError` at the boundary.

use survey_core::FetchError;
use thiserror::Error;

/// Result type alias for definition service operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors related to definition service requests.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Request failed with an HTTP error status.
    #[error("Survey service request failed with status {status}: {url}")]
    ApiRequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The service answered 404.
    #[error("Survey service has no resource at {url}")]
    NotFound {
        /// The URL that was requested
        url: String,
    },

    /// The payload was well-formed JSON but not what was asked for.
    #[error("Invalid response from survey service: {message}")]
    InvalidResponse {
        /// Description of what was invalid
        message: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl RemoteError {
    /// Map to the port error for `campaign_id`.
    pub fn into_fetch_error(self, campaign_id: &str) -> FetchError {
        match self {
            Self::NotFound { .. } => FetchError::NotFound {
                campaign_id: campaign_id.to_string(),
            },
            Self::ApiRequestFailed { status, .. } => FetchError::Network {
                message: self.to_string(),
                status_code: Some(status),
            },
            Self::Network(ref e) => FetchError::Network {
                message: self.to_string(),
                status_code: e.status().map(|s| s.as_u16()),
            },
            Self::InvalidUrl(_) => FetchError::network(self.to_string()),
            Self::InvalidResponse { .. } | Self::JsonParse(_) => FetchError::Decode {
                message: self.to_string(),
            },
        }
    }
}
