//! Fire-and-forget lifecycle event publication.
//!
//! The bus is deliberately decoupled from the completion path: consumers
//! observe retrieval lifecycle events without affecting control flow or
//! settlement timing. Having no subscriber is not an error. The bus is a
//! constructed dependency injected into the executor, so tests can substitute
//! a capturing implementation.

use serde::Serialize;
use tokio::sync::broadcast;

/// Default channel capacity for [`BroadcastBus`].
const DEFAULT_CAPACITY: usize = 256;

/// A lifecycle event observed during one retrieval.
///
/// Every variant carries `url` and `resource_id` so subscribers can correlate
/// events from concurrent retrievals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RetrievalEvent {
    /// Transmission started.
    Started {
        /// Target resource locator.
        url: String,
        /// Logical identifier for the resource.
        resource_id: String,
    },
    /// Bytes arrived.
    Progress {
        /// Target resource locator.
        url: String,
        /// Logical identifier for the resource.
        resource_id: String,
        /// Bytes received so far.
        loaded: u64,
        /// Total bytes when the length is computable.
        total: Option<u64>,
        /// `round(loaded / total * 100)`, only when the length is computable.
        percent_complete: Option<u8>,
    },
    /// Transmission finished, on every path including error and abort.
    Ended {
        /// Target resource locator.
        url: String,
        /// Logical identifier for the resource.
        resource_id: String,
    },
}

/// Notification sink for retrieval lifecycle events.
///
/// `publish` is fire-and-forget: no return value, no effect on the
/// retrieval's control flow or completion.
pub trait EventBus: Send + Sync {
    /// Publish one event. Must not block or fail the caller.
    fn publish(&self, event: RetrievalEvent);
}

/// Bus that discards every event. Used by callers that do not observe.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBus;

impl EventBus for NullBus {
    fn publish(&self, _event: RetrievalEvent) {}
}

/// Broadcast-backed bus. Every subscriber receives every event published
/// after it subscribed; slow subscribers may lag and lose the oldest events.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<RetrievalEvent>,
}

impl BroadcastBus {
    /// Create a bus with the given channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RetrievalEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, event: RetrievalEvent) {
        // A send error only means there is no subscriber, which is fine.
        let _ = self.sender.send(event);
    }
}
