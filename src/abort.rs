//! Cooperative abort signalling.
//!
//! Provides a lightweight [`AbortHandle`] that can be cloned across tasks to
//! request early termination of an in-flight retrieval. The transport checks
//! the handle between suspension points and emits a terminal `Abort` event
//! when it observes the signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cloneable handle used to abort an in-flight retrieval.
///
/// The signal fires at most once; repeated [`AbortHandle::abort`] calls are
/// no-ops.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    inner: Arc<AbortInner>,
}

#[derive(Debug, Default)]
struct AbortInner {
    aborted: AtomicBool,
    notify: Notify,
}

impl AbortHandle {
    /// Create a new, unsignalled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Notifies all waiters exactly once.
    pub fn abort(&self) {
        if !self.inner.aborted.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Whether abort has been requested.
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Wait until abort is requested. Returns immediately if already set.
    pub async fn aborted(&self) {
        if self.is_aborted() {
            return;
        }
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register interest before the second check so a signal landing
        // between check and await is not missed.
        notified.as_mut().enable();
        if self.is_aborted() {
            return;
        }
        notified.await;
    }
}
