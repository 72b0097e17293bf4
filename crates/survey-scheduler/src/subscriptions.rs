//! Tracked lifecycle subscriptions.

use std::sync::{Arc, Mutex, PoisonError};

use survey_core::{LifecycleTopic, PageEventSender, PageLifecycleSource, SubscriptionId};

/// Every subscription one scheduler holds with the page source.
///
/// Clones share the same set, so the controller can tear an attempt's
/// subscriptions down synchronously while the scheduler task is still
/// winding down. [`clear`](Self::clear) is idempotent.
#[derive(Clone)]
pub struct Subscriptions {
    pages: Arc<dyn PageLifecycleSource>,
    ids: Arc<Mutex<Vec<SubscriptionId>>>,
}

impl Subscriptions {
    pub fn new(pages: Arc<dyn PageLifecycleSource>) -> Self {
        Self {
            pages,
            ids: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn ids(&self) -> std::sync::MutexGuard<'_, Vec<SubscriptionId>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe `sink` to `topic` and track the subscription.
    pub fn add(&self, topic: LifecycleTopic, sink: PageEventSender) -> SubscriptionId {
        let id = self.pages.subscribe(topic, sink);
        self.ids().push(id);
        id
    }

    /// Drop a single tracked subscription.
    pub fn remove(&self, id: SubscriptionId) {
        let tracked = {
            let mut ids = self.ids();
            let before = ids.len();
            ids.retain(|&s| s != id);
            ids.len() != before
        };
        if tracked {
            self.pages.unsubscribe(id);
        }
    }

    /// Drop every tracked subscription.
    pub fn clear(&self) {
        let drained: Vec<_> = self.ids().drain(..).collect();
        for id in drained {
            self.pages.unsubscribe(id);
        }
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
