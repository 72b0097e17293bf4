//! Admission outcomes produced by the eligibility gate.

use serde::{Deserialize, Serialize};

/// Diagnostic reason attached to a gate decision.
///
/// Used only for telemetry; control flow looks at [`GateDecision::allowed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilteringResult {
    /// A prompt was already displayed for this campaign.
    AlreadyDisplayed,
    /// The operator force switch bypassed every check.
    ForceEnabled,
    /// The daily roll has already been consumed today.
    AlreadySampledToday,
    /// No usable sampling rate is configured.
    ProbabilityMissing,
    /// The roll happened and did not select this user.
    NonZeroRoll,
    /// The roll happened and selected this user.
    Selected,
    /// The install is still in its first run.
    FirstRunUser,
}

impl FilteringResult {
    /// Stable string name, used in logs and the CLI.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyDisplayed => "already_displayed",
            Self::ForceEnabled => "force_enabled",
            Self::AlreadySampledToday => "already_sampled_today",
            Self::ProbabilityMissing => "probability_missing",
            Self::NonZeroRoll => "non_zero_roll",
            Self::Selected => "selected",
            Self::FirstRunUser => "first_run_user",
        }
    }
}

impl std::fmt::Display for FilteringResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one eligibility evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    /// Whether the caller may proceed to download the survey.
    pub allowed: bool,
    /// Diagnostic reason, absent when none is defined (consent, attempts cap).
    pub reason: Option<FilteringResult>,
}

impl GateDecision {
    /// An approving decision.
    pub const fn allow(reason: FilteringResult) -> Self {
        Self {
            allowed: true,
            reason: Some(reason),
        }
    }

    /// A denying decision with a reason code.
    pub const fn deny(reason: FilteringResult) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    /// A denying decision that records no reason.
    pub const fn deny_silently() -> Self {
        Self {
            allowed: false,
            reason: None,
        }
    }
}
