//! Per-retrieval request context and the one-shot settlement handle.

use crate::retriever::{RetrievalError, RetrievalResult};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Mutable record shared across all callbacks of one retrieval.
///
/// Owned exclusively by one executor call for the lifetime of one retrieval;
/// hooks receive it by reference and never outside that scope.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Target resource locator. Immutable after issuance.
    pub url: String,
    /// Logical identifier correlated into emitted events. Immutable.
    pub resource_id: String,
    /// Header pairs actually transmitted, built once before transmission.
    pub headers: Vec<(String, String)>,
    /// Exactly-one-shot settlement handle.
    pub completion: Completion,
}

/// Exactly-one-shot settlement handle.
///
/// Resolve with the payload bytes or reject with a classified error; the
/// first settlement wins and every later call is a no-op. The guard is an
/// atomic check-and-set, so the invariant holds even if the runtime
/// dispatches callbacks from separate threads.
#[derive(Debug, Clone)]
pub struct Completion {
    inner: Arc<CompletionInner>,
}

#[derive(Debug)]
struct CompletionInner {
    settled: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<RetrievalResult<Bytes>>>>,
}

impl Completion {
    /// Create a handle and the receiver its settlement arrives on.
    pub fn channel() -> (Self, oneshot::Receiver<RetrievalResult<Bytes>>) {
        let (sender, receiver) = oneshot::channel();
        let completion = Self {
            inner: Arc::new(CompletionInner {
                settled: AtomicBool::new(false),
                sender: Mutex::new(Some(sender)),
            }),
        };
        (completion, receiver)
    }

    /// Settle with the payload bytes. Returns `false` when already settled.
    pub fn resolve(&self, payload: Bytes) -> bool {
        self.settle(Ok(payload))
    }

    /// Settle with a classified error. Returns `false` when already settled.
    pub fn reject(&self, error: RetrievalError) -> bool {
        self.settle(Err(error))
    }

    /// Whether the handle has already settled.
    pub fn is_settled(&self) -> bool {
        self.inner.settled.load(Ordering::SeqCst)
    }

    fn settle(&self, outcome: RetrievalResult<Bytes>) -> bool {
        if self.inner.settled.swap(true, Ordering::SeqCst) {
            return false;
        }
        let sender = self
            .inner
            .sender
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if let Some(sender) = sender {
            // The receiver being gone just means the caller stopped waiting.
            let _ = sender.send(outcome);
        }
        true
    }
}
