//! Process-wide session flag.
//!
//! At most one survey prompt is shown per app session, whatever the
//! campaign. The host creates one [`SessionFlag`] at process start and passes
//! clones to every scheduler; clones share the same underlying flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "a survey prompt has been shown this session" marker.
#[derive(Debug, Clone, Default)]
pub struct SessionFlag {
    shown: Arc<AtomicBool>,
}

impl SessionFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim the session's single prompt.
    ///
    /// Returns `true` for exactly one caller; every later call returns
    /// `false` until [`release`](Self::release).
    pub fn try_claim(&self) -> bool {
        self.shown
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Give the claim back after a render that never reached the screen.
    pub fn release(&self) {
        self.shown.store(false, Ordering::SeqCst);
    }

    /// Whether a prompt has been shown this session.
    pub fn is_set(&self) -> bool {
        self.shown.load(Ordering::SeqCst)
    }
}
