//! Exactly-once asynchronous operation orchestration.
//!
//! The pattern: create a scoped side resource, trigger an external
//! asynchronous action, wait for a single notification, extract the result,
//! and guarantee cleanup exactly once. The notification source is
//! at-least-once; a drop guard enforces exactly-once cleanup on every exit
//! path, including the caller abandoning the future mid-wait.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::debug;

/// Notification subscription for one operation. The orchestrator consumes
/// the first message and ignores the rest.
pub type Notifications = mpsc::UnboundedReceiver<()>;

/// Failures of a one-shot operation.
#[derive(Debug, thiserror::Error)]
pub enum OneShotError {
    /// Acquiring the scoped resource failed; nothing to clean up.
    #[error("setup failed: {0}")]
    Setup(String),

    /// Starting the external action failed. Cleanup has already run.
    #[error("trigger failed: {0}")]
    Trigger(String),

    /// The notification handler failed. Cleanup has already run.
    #[error("notification handler failed: {0}")]
    Notify(String),

    /// The external trigger never produced a notification within the
    /// configured window. Cleanup has already run.
    #[error("no notification within {0:?}")]
    NotificationTimeout(Duration),

    /// The notification source closed before notifying. Cleanup has already
    /// run.
    #[error("notification source closed before notifying")]
    SourceClosed,
}

/// Run one exactly-once operation.
///
/// `setup` acquires the scoped resource; `subscribe` returns the
/// notification receiver for it; `trigger` starts the external asynchronous
/// action; `on_notify` runs on the first notification only; `cleanup` runs
/// exactly once on every exit path after setup succeeds, including
/// `on_notify` failure, timeout, a closed source, and the caller dropping
/// the returned future. Notifications after the first are ignored.
///
/// With `timeout` of `None` the wait is unbounded and the caller is
/// responsible for its own guard.
pub async fn run_one_shot<R, T, S, Sub, Tr, N, C>(
    timeout: Option<Duration>,
    setup: S,
    subscribe: Sub,
    trigger: Tr,
    on_notify: N,
    cleanup: C,
) -> Result<T, OneShotError>
where
    S: FnOnce() -> Result<R, OneShotError>,
    Sub: FnOnce(&mut R) -> Notifications,
    Tr: FnOnce(&mut R) -> Result<(), OneShotError>,
    N: FnOnce(&mut R) -> Result<T, OneShotError>,
    C: FnOnce(R),
{
    let mut scoped = ScopedResource::new(setup()?, cleanup);
    let mut notifications = subscribe(scoped.resource());
    trigger(scoped.resource())?;

    let first = match timeout {
        Some(window) => match time::timeout(window, notifications.recv()).await {
            Ok(first) => first,
            Err(_) => return Err(OneShotError::NotificationTimeout(window)),
        },
        None => notifications.recv().await,
    };

    match first {
        Some(()) => {
            let result = on_notify(scoped.resource());
            // Unsubscribe before disposal; anything still queued is dropped
            // with the receiver.
            drop(notifications);
            debug!("one-shot operation notified; releasing resource");
            result
        }
        None => Err(OneShotError::SourceClosed),
    }
}

/// Holds the scoped resource and runs cleanup exactly once when dropped.
/// This is the `completed` guard: every exit path funnels through one drop.
struct ScopedResource<R, C: FnOnce(R)> {
    resource: Option<R>,
    cleanup: Option<C>,
}

impl<R, C: FnOnce(R)> ScopedResource<R, C> {
    fn new(resource: R, cleanup: C) -> Self {
        Self {
            resource: Some(resource),
            cleanup: Some(cleanup),
        }
    }

    fn resource(&mut self) -> &mut R {
        // Present until drop by construction.
        self.resource.as_mut().expect("resource taken before drop")
    }
}

impl<R, C: FnOnce(R)> Drop for ScopedResource<R, C> {
    fn drop(&mut self) {
        if let (Some(resource), Some(cleanup)) = (self.resource.take(), self.cleanup.take()) {
            cleanup(resource);
        }
    }
}
