//! HTTP backend abstraction for the definition service.
//!
//! The production implementation uses reqwest with automatic retry for
//! transient errors; tests inject a fake backend.

use crate::config::RemoteClientConfig;
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that can fetch JSON from URLs.
///
/// This is an implementation detail - external code should use the
/// `SurveyDefinitionFetcher` port.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch JSON from a URL and deserialize it.
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> RemoteResult<T>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest with retry logic.
///
/// Implements exponential backoff for server errors (5xx) and network
/// errors. Client errors (4xx) fail immediately.
pub struct ReqwestBackend {
    client: reqwest::Client,
    max_retries: u8,
    retry_base_delay: Duration,
}

impl ReqwestBackend {
    /// Create a new reqwest backend with the given configuration.
    pub fn new(config: &RemoteClientConfig) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    /// Fetch a URL with automatic retry for transient errors.
    async fn fetch_with_retry(&self, url: &Url) -> RemoteResult<reqwest::Response> {
        let mut last_error: Option<RemoteError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.retry_base_delay, attempt);
                tracing::debug!(
                    target: "survey.remote",
                    %url,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Retrying definition request"
                );
                tokio::time::sleep(delay).await;
            }

            match self.client.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    // 5xx errors are retryable (server-side issues)
                    if status.is_server_error() && attempt < self.max_retries {
                        last_error = Some(RemoteError::ApiRequestFailed {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(RemoteError::NotFound {
                            url: url.to_string(),
                        });
                    }

                    // 4xx errors or final attempt - fail immediately
                    return Err(RemoteError::ApiRequestFailed {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                Err(e) => {
                    // Network errors are retryable
                    if attempt < self.max_retries {
                        last_error = Some(e.into());
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RemoteError::InvalidResponse {
            message: "Unknown error during fetch".to_string(),
        }))
    }
}

/// Delay before retry number `attempt` (1-based).
fn backoff_delay(base: Duration, attempt: u8) -> Duration {
    base.saturating_mul(2u32.saturating_pow(u32::from(attempt.saturating_sub(1))))
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> RemoteResult<T> {
        let response = self.fetch_with_retry(url).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// A fake HTTP backend that returns canned JSON keyed by URL suffix.
    #[derive(Default)]
    pub struct FakeBackend {
        responses: Mutex<HashMap<String, serde_json::Value>>,
        failures: Mutex<HashMap<String, u16>>,
        pub calls: Arc<AtomicUsize>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer URLs ending in `suffix` with `json`.
        pub fn with_response(self, suffix: &str, json: serde_json::Value) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(suffix.to_string(), json);
            self
        }

        /// Answer URLs ending in `suffix` with HTTP `status`.
        pub fn with_status(self, suffix: &str, status: u16) -> Self {
            self.failures
                .lock()
                .unwrap()
                .insert(suffix.to_string(), status);
            self
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> RemoteResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let path = url.path();

            let failure = self
                .failures
                .lock()
                .unwrap()
                .iter()
                .find(|(suffix, _)| path.ends_with(suffix.as_str()))
                .map(|(_, status)| *status);
            if let Some(status) = failure {
                return Err(RemoteError::ApiRequestFailed {
                    status,
                    url: url.to_string(),
                });
            }

            let json = self
                .responses
                .lock()
                .unwrap()
                .iter()
                .find(|(suffix, _)| path.ends_with(suffix.as_str()))
                .map(|(_, json)| json.clone())
                .ok_or_else(|| RemoteError::NotFound {
                    url: url.to_string(),
                })?;

            serde_json::from_value(json).map_err(Into::into)
        }
    }
}
