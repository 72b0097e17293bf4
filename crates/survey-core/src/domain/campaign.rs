//! Campaign configuration.

use serde::{Deserialize, Serialize};

/// Immutable configuration for one survey campaign.
///
/// Built once when a controller is constructed (usually through
/// [`SurveySettings::resolve_campaign`](crate::settings::SurveySettings::resolve_campaign))
/// and never mutated afterwards. Fields are private so a config cannot drift
/// after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    campaign_id: String,
    sample_probability: f64,
    max_download_attempts: u32,
}

impl CampaignConfig {
    /// Create a campaign config.
    ///
    /// `sample_probability` is clamped into `0.0..=1.0`; a NaN probability is
    /// treated as `0.0`. A `max_download_attempts` of `0` means unlimited.
    pub fn new(
        campaign_id: impl Into<String>,
        sample_probability: f64,
        max_download_attempts: u32,
    ) -> Self {
        let sample_probability = if sample_probability.is_nan() {
            0.0
        } else {
            sample_probability.clamp(0.0, 1.0)
        };

        Self {
            campaign_id: campaign_id.into(),
            sample_probability,
            max_download_attempts,
        }
    }

    /// The trigger id identifying this campaign.
    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }

    /// Probability in `0.0..=1.0` that a daily roll selects this user.
    pub const fn sample_probability(&self) -> f64 {
        self.sample_probability
    }

    /// Maximum number of definition downloads; `0` means unlimited.
    pub const fn max_download_attempts(&self) -> u32 {
        self.max_download_attempts
    }

    /// Whether `attempts` has reached a positive download cap.
    pub const fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_download_attempts > 0 && attempts >= self.max_download_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_is_clamped() {
        assert!((CampaignConfig::new("a", 1.5, 0).sample_probability() - 1.0).abs() < f64::EPSILON);
        assert!(CampaignConfig::new("a", -0.2, 0).sample_probability().abs() < f64::EPSILON);
        assert!(CampaignConfig::new("a", f64::NAN, 0).sample_probability().abs() < f64::EPSILON);
    }

    #[test]
    fn test_attempts_exhausted() {
        let capped = CampaignConfig::new("a", 0.5, 2);
        assert!(!capped.attempts_exhausted(1));
        assert!(capped.attempts_exhausted(2));
        assert!(capped.attempts_exhausted(3));

        let unlimited = CampaignConfig::new("a", 0.5, 0);
        assert!(!unlimited.attempts_exhausted(u32::MAX));
    }
}
