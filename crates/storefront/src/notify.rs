//! User-facing notices.
//!
//! User-visible outcomes (saved, failed to load, added to cart) go through a
//! [`Notifier`]. Everything else is only logged.

use std::sync::{Mutex, PoisonError};

use vexaparts_core::NoticeKind;

/// Surface for success and error notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NoticeKind);
}

/// Notifier that emits notices as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        match kind {
            NoticeKind::Success => tracing::info!(notice = message, "Notice"),
            NoticeKind::Error => tracing::error!(notice = message, "Notice"),
        }
    }
}

/// Notifier that records every notice, for tests and batch drivers.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<(String, NoticeKind)>>,
}

impl CollectingNotifier {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<(String, NoticeKind)> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of notices of the given kind.
    #[must_use]
    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, k)| *k == kind)
            .count()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((message.to_string(), kind));
    }
}
