//! Survey settings and validation.
//!
//! Settings come from two places: remote experiment parameters (trigger id,
//! sampling rate, download cap) and operator/debug switches (forced trigger
//! id, force enable). Both are merged into one [`SurveySettings`] which
//! resolves to the immutable [`CampaignConfig`] at controller construction.

use serde::{Deserialize, Serialize};

use crate::domain::CampaignConfig;

/// Default base URL of the survey definition service.
pub const DEFAULT_DEFINITION_BASE_URL: &str = "https://surveys.example.com/api/v1/campaigns";

/// Survey settings.
///
/// All fields are optional to support partial configuration and graceful
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SurveySettings {
    /// Trigger id of the active campaign, from experiment configuration.
    pub trigger_id: Option<String>,

    /// Operator override replacing `trigger_id`.
    pub forced_trigger_id: Option<String>,

    /// Operator switch bypassing every admission check except consent.
    pub force_enabled: bool,

    /// Sampling denominator: a daily roll selects with probability `1 / max_number`.
    ///
    /// Absent means sampling is disabled (probability 0), never 100%.
    pub max_number: Option<u32>,

    /// Cap on definition downloads per campaign; absent means unlimited.
    pub max_download_attempts: Option<u32>,

    /// Base URL of the survey definition service.
    pub definition_base_url: Option<String>,
}

impl SurveySettings {
    /// Trigger id in effect: the forced one wins over the configured one.
    pub fn effective_trigger_id(&self) -> Option<&str> {
        self.forced_trigger_id
            .as_deref()
            .or(self.trigger_id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    /// Daily selection probability derived from `max_number`.
    pub fn sample_probability(&self) -> f64 {
        match self.max_number {
            Some(n) if n > 0 => 1.0 / f64::from(n),
            _ => 0.0,
        }
    }

    /// Effective definition service base URL.
    pub fn effective_definition_base_url(&self) -> &str {
        self.definition_base_url
            .as_deref()
            .unwrap_or(DEFAULT_DEFINITION_BASE_URL)
    }

    /// Resolve the campaign to run, if any trigger id is configured.
    pub fn resolve_campaign(&self) -> Option<CampaignConfig> {
        self.effective_trigger_id().map(|id| {
            CampaignConfig::new(
                id,
                self.sample_probability(),
                self.max_download_attempts.unwrap_or(0),
            )
        })
    }

    /// Apply non-empty values from `overrides` on top of these settings.
    pub fn merge(&mut self, overrides: &Self) {
        if overrides.trigger_id.is_some() {
            self.trigger_id.clone_from(&overrides.trigger_id);
        }
        if overrides.forced_trigger_id.is_some() {
            self.forced_trigger_id.clone_from(&overrides.forced_trigger_id);
        }
        if overrides.force_enabled {
            self.force_enabled = true;
        }
        if overrides.max_number.is_some() {
            self.max_number = overrides.max_number;
        }
        if overrides.max_download_attempts.is_some() {
            self.max_download_attempts = overrides.max_download_attempts;
        }
        if overrides.definition_base_url.is_some() {
            self.definition_base_url
                .clone_from(&overrides.definition_base_url);
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Trigger id cannot be empty")]
    EmptyTriggerId,

    #[error("max_number must be at least 1, got 0")]
    ZeroMaxNumber,

    #[error("Definition base URL must start with http:// or https://, got {0}")]
    InvalidBaseUrl(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &SurveySettings) -> Result<(), SettingsError> {
    let ids = [&settings.trigger_id, &settings.forced_trigger_id];
    if ids
        .iter()
        .any(|id| id.as_ref().is_some_and(|s| s.trim().is_empty()))
    {
        return Err(SettingsError::EmptyTriggerId);
    }

    if settings.max_number == Some(0) {
        return Err(SettingsError::ZeroMaxNumber);
    }

    if let Some(url) = &settings.definition_base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::InvalidBaseUrl(url.clone()));
        }
    }

    Ok(())
}
