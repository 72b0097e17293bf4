//! Dismissal causes and the closing-state bookkeeping derived from them.

use serde::{Deserialize, Serialize};

/// Why a displayed survey prompt went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissCause {
    /// The user swiped or tapped the close button.
    Gesture,
    /// The prompt timed out on screen.
    Timer,
    /// The hosting page was hidden or replaced.
    PageSwitched,
    /// The user accepted the invitation.
    PrimaryAction,
    /// A secondary link was followed; already booked by its own handler.
    SecondaryAction,
    /// The host container was torn down before the user could react.
    ScopeDestroyed,
    /// Anything else.
    Other,
}

impl DismissCause {
    /// Whether this cause consumes the campaign's one-shot display.
    ///
    /// Every cause except `ScopeDestroyed` and `SecondaryAction` counts as
    /// displayed; unknown causes prefer under-showing over re-prompting.
    pub const fn counts_as_displayed(self) -> bool {
        !matches!(self, Self::ScopeDestroyed | Self::SecondaryAction)
    }

    /// Closing-state bucket reported to diagnostics.
    pub const fn closing_state(self) -> ClosingState {
        match self {
            Self::PrimaryAction => ClosingState::Accepted,
            Self::Gesture => ClosingState::CloseButton,
            Self::Timer | Self::Other => ClosingState::VisibleIndirect,
            Self::PageSwitched => ClosingState::HiddenIndirect,
            Self::ScopeDestroyed => ClosingState::ScopeDestroyed,
            Self::SecondaryAction => ClosingState::Unknown,
        }
    }

    /// Stable string name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gesture => "gesture",
            Self::Timer => "timer",
            Self::PageSwitched => "page_switched",
            Self::PrimaryAction => "primary_action",
            Self::SecondaryAction => "secondary_action",
            Self::ScopeDestroyed => "scope_destroyed",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for DismissCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a prompt closed, as reported in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosingState {
    Accepted,
    CloseButton,
    VisibleIndirect,
    HiddenIndirect,
    ScopeDestroyed,
    Unknown,
}
