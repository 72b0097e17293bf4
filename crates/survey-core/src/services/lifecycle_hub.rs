//! In-memory page lifecycle source.
//!
//! Hosts that track their pages in-process can drive this hub directly
//! instead of implementing [`PageLifecycleSource`] themselves. It is also the
//! page source used throughout the scheduler tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::{LifecycleTopic, PageEvent, PageId, PageSnapshot, SubscriptionId};
use crate::ports::{PageEventSender, PageLifecycleSource};

#[derive(Default)]
struct HubState {
    next_id: u64,
    active: Option<PageSnapshot>,
    subscriptions: HashMap<SubscriptionId, (LifecycleTopic, PageEventSender)>,
}

impl HubState {
    fn dispatch(&mut self, event: PageEvent) {
        // Closed receivers are dropped along the way.
        self.subscriptions
            .retain(|_, (topic, sink)| !topic.matches(&event) || sink.send(event).is_ok());
    }

    fn update_active(&mut self, page: PageId, f: impl FnOnce(&mut PageSnapshot)) {
        if let Some(active) = self.active.as_mut().filter(|a| a.id == page) {
            f(active);
        }
    }
}

/// Page lifecycle source backed by in-process state.
#[derive(Default)]
pub struct InMemoryLifecycleHub {
    state: Mutex<HubState>,
}

impl InMemoryLifecycleHub {
    /// Create a hub with no active page.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut HubState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Replace the active page and notify `ActivePage` subscribers.
    pub fn set_active_page(&self, page: Option<PageSnapshot>) {
        self.with_state(|state| {
            state.active = page;
            state.dispatch(PageEvent::ActivePageChanged { page });
        });
    }

    /// Mark `page` as done loading.
    pub fn finish_loading(&self, page: PageId) {
        self.with_state(|state| {
            state.update_active(page, |s| s.loading = false);
            state.dispatch(PageEvent::LoadFinished { page });
        });
    }

    /// Change the interactability of `page`.
    pub fn set_interactable(&self, page: PageId, interactable: bool) {
        self.with_state(|state| {
            state.update_active(page, |s| s.interactable = interactable);
            state.dispatch(PageEvent::InteractabilityChanged { page, interactable });
        });
    }

    /// Hide `page`; it stops being interactable.
    pub fn hide(&self, page: PageId) {
        self.with_state(|state| {
            state.update_active(page, |s| s.interactable = false);
            state.dispatch(PageEvent::Hidden { page });
        });
    }

    /// Notify that the application came back to the foreground.
    pub fn resume_app(&self) {
        self.with_state(|state| state.dispatch(PageEvent::AppResumed));
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.with_state(|state| state.subscriptions.len())
    }

    /// Whether any live subscription listens to `topic`.
    pub fn is_subscribed(&self, topic: LifecycleTopic) -> bool {
        self.with_state(|state| state.subscriptions.values().any(|(t, _)| *t == topic))
    }
}

impl PageLifecycleSource for InMemoryLifecycleHub {
    fn active_page(&self) -> Option<PageSnapshot> {
        self.with_state(|state| state.active)
    }

    fn subscribe(&self, topic: LifecycleTopic, sink: PageEventSender) -> SubscriptionId {
        self.with_state(|state| {
            state.next_id += 1;
            let id = SubscriptionId(state.next_id);
            state.subscriptions.insert(id, (topic, sink));
            id
        })
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.with_state(|state| {
            state.subscriptions.remove(&id);
        });
    }
}
