//! Page lifecycle types.
//!
//! A "page" is whatever foreground surface may host the invitation. The host
//! owns pages; the scheduler only ever sees ids, snapshots and events.

use serde::{Deserialize, Serialize};

/// Host-assigned identifier of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u64);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// Point-in-time view of a page's readiness inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub id: PageId,
    /// Still loading content.
    pub loading: bool,
    /// Foregrounded and not obscured.
    pub interactable: bool,
}

impl PageSnapshot {
    /// Snapshot of a page that has finished loading and accepts input.
    pub const fn ready(id: PageId) -> Self {
        Self {
            id,
            loading: false,
            interactable: true,
        }
    }

    /// Snapshot of a page that is still loading and not yet interactable.
    pub const fn loading(id: PageId) -> Self {
        Self {
            id,
            loading: true,
            interactable: false,
        }
    }

    /// Whether the page can host the prompt right now.
    pub const fn is_ready(&self) -> bool {
        !self.loading && self.interactable
    }
}

/// Lifecycle notification delivered to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// The foreground page changed (or went away).
    ActivePageChanged { page: Option<PageSnapshot> },
    /// The page finished loading.
    LoadFinished { page: PageId },
    /// The page gained or lost interactability.
    InteractabilityChanged { page: PageId, interactable: bool },
    /// The page was hidden or backgrounded.
    Hidden { page: PageId },
    /// The host application returned to the foreground.
    AppResumed,
}

/// What a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleTopic {
    /// Changes of the active page.
    ActivePage,
    /// Load, interactability and hide events of one page.
    Page(PageId),
    /// Application resume events.
    App,
}

impl LifecycleTopic {
    /// Whether an event belongs to this topic.
    pub fn matches(&self, event: &PageEvent) -> bool {
        match (self, event) {
            (Self::ActivePage, PageEvent::ActivePageChanged { .. })
            | (Self::App, PageEvent::AppResumed) => true,
            (
                Self::Page(id),
                PageEvent::LoadFinished { page }
                | PageEvent::InteractabilityChanged { page, .. }
                | PageEvent::Hidden { page },
            ) => id == page,
            _ => false,
        }
    }
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);
