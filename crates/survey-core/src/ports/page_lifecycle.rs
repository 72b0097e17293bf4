//! Page lifecycle port.
//!
//! The host exposes its foreground page through this trait. Subscribers hand
//! over a channel sender; the host pushes matching [`PageEvent`]s into it
//! until the subscription is removed.

use tokio::sync::mpsc;

use crate::domain::{LifecycleTopic, PageEvent, PageSnapshot, SubscriptionId};

/// Sending half handed to the host for a subscription.
pub type PageEventSender = mpsc::UnboundedSender<PageEvent>;

/// Source of page lifecycle notifications.
///
/// # Contract
///
/// - `subscribe` returns a fresh id; events matching the topic are sent
///   to `sink` in the order they happen
/// - `unsubscribe` is idempotent; unknown ids are ignored
/// - The host owns pages; subscribers only keep ids
pub trait PageLifecycleSource: Send + Sync {
    /// The page currently eligible to host a prompt, if any.
    fn active_page(&self) -> Option<PageSnapshot>;

    /// Register `sink` for events of `topic`.
    fn subscribe(&self, topic: LifecycleTopic, sink: PageEventSender) -> SubscriptionId;

    /// Remove a subscription.
    fn unsubscribe(&self, id: SubscriptionId);
}
