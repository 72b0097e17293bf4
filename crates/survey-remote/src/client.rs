//! Definition fetcher over HTTP.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::DateTime;
use survey_core::{Clock, FetchError, SurveyDefinition, SurveyDefinitionFetcher, SystemClock};
use url::Url;

use crate::config::RemoteClientConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::http::{HttpBackend, ReqwestBackend};

// ============================================================================
// Type Aliases
// ============================================================================

/// Default fetcher using the reqwest HTTP backend.
pub type DefaultSurveyFetcher = HttpSurveyFetcher<ReqwestBackend>;

// ============================================================================
// Client
// ============================================================================

/// Fetches survey definitions from the definition service.
///
/// Generic over the HTTP backend so tests can inject canned responses. Use
/// [`DefaultSurveyFetcher`] in production.
pub struct HttpSurveyFetcher<B: HttpBackend> {
    backend: B,
    base_url: Url,
    clock: Arc<dyn Clock>,
    cache: Mutex<HashMap<String, SurveyDefinition>>,
}

impl DefaultSurveyFetcher {
    /// Create a fetcher with the given configuration.
    pub fn new(config: &RemoteClientConfig) -> Result<Self, FetchError> {
        let base_url = parse_base_url(&config.base_url)
            .map_err(|e| FetchError::network(e.to_string()))?;
        let backend =
            ReqwestBackend::new(config).map_err(|e| FetchError::network(e.to_string()))?;
        Ok(Self::with_backend(base_url, backend, Arc::new(SystemClock)))
    }
}

impl<B: HttpBackend> HttpSurveyFetcher<B> {
    /// Create a fetcher with a custom backend and clock.
    pub(crate) fn with_backend(base_url: Url, backend: B, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            base_url,
            clock,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// URL of the definition for `campaign_id`.
    fn definition_url(&self, campaign_id: &str) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidResponse {
                message: format!("base URL cannot take path segments: {}", self.base_url),
            })?
            .pop_if_empty()
            .push(campaign_id);
        Ok(url)
    }

    async fn download(&self, campaign_id: &str) -> RemoteResult<SurveyDefinition> {
        let url = self.definition_url(campaign_id)?;
        let definition: SurveyDefinition = self.backend.get_json(&url).await?;

        if definition.campaign_id != campaign_id {
            return Err(RemoteError::InvalidResponse {
                message: format!(
                    "asked for campaign {campaign_id}, got {}",
                    definition.campaign_id
                ),
            });
        }
        Ok(definition)
    }

    fn cached(&self, campaign_id: &str) -> Option<SurveyDefinition> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(campaign_id)
            .cloned()
    }
}

fn parse_base_url(raw: &str) -> RemoteResult<Url> {
    Ok(Url::parse(raw)?)
}

#[async_trait]
impl<B: HttpBackend> SurveyDefinitionFetcher for HttpSurveyFetcher<B> {
    async fn fetch(&self, campaign_id: &str) -> Result<SurveyDefinition, FetchError> {
        let definition = self
            .download(campaign_id)
            .await
            .map_err(|e| e.into_fetch_error(campaign_id))?;

        tracing::debug!(
            target: "survey.remote",
            campaign_id,
            expires_at = ?definition.expires_at,
            "Fetched survey definition"
        );

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(campaign_id.to_string(), definition.clone());
        Ok(definition)
    }

    async fn is_expired(&self, campaign_id: &str) -> Result<bool, FetchError> {
        let definition = match self.cached(campaign_id) {
            Some(definition) => definition,
            None => self.fetch(campaign_id).await?,
        };

        let Some(now) = DateTime::from_timestamp_millis(self.clock.now_millis()) else {
            return Ok(false);
        };
        Ok(definition.is_expired_at(now))
    }
}
