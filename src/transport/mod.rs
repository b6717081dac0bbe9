//! Transport seam: lifecycle events and the trait the executor drives.
//!
//! A transport turns one issued request into an ordered stream of
//! [`TransportEvent`]s: start, zero or more progress updates, monotonic
//! ready-state transitions, a terminal-shaped event (`Done`, `Error` or
//! `Abort`), and a final `End` that fires on every path. The executor
//! classifies and settles; the transport never interprets response status.

use crate::abort::AbortHandle;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;

pub mod http;

pub use http::HttpTransport;

/// Ordered stream of lifecycle events for one issued request.
pub type TransportEventStream = Pin<Box<dyn Stream<Item = TransportEvent> + Send>>;

/// Snapshot of a completed response, handed to the executor at
/// [`ReadyState::Done`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers as received.
    pub headers: Vec<(String, String)>,
    /// Full response body.
    pub body: Bytes,
}

impl RawResponse {
    /// Whether the status signals success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Ready-state of one request. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Request issued, nothing received yet.
    Opened,
    /// Response headers received.
    HeadersReceived,
    /// Body transfer in progress.
    Loading,
    /// Transfer complete; the event carries the raw response.
    Done,
}

/// One lifecycle event emitted by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Transmission started.
    Start,
    /// Bytes arrived. `total` is absent when the length is not computable,
    /// never a meaningless zero.
    Progress {
        /// Bytes received so far.
        loaded: u64,
        /// Total bytes when known from the response headers.
        total: Option<u64>,
    },
    /// Ready-state transition. `response` is present only at
    /// [`ReadyState::Done`].
    ReadyState {
        /// The state reached.
        state: ReadyState,
        /// Raw response snapshot, at `Done` only.
        response: Option<RawResponse>,
    },
    /// Transmission finished. Fires once on every path, after success,
    /// error, or abort.
    End,
    /// The transport failed locally (connection, timeout, mid-body error).
    Error {
        /// Human-readable failure cause.
        cause: String,
    },
    /// The request was aborted while in flight.
    Abort,
}

/// A transport issues one request and reports its lifecycle as events.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET for `url` with the already-filtered header pairs.
    ///
    /// Failures before or during transfer surface as [`TransportEvent::Error`]
    /// items in the returned stream, never as a panic or a missing `End`.
    async fn issue(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
        abort: AbortHandle,
    ) -> TransportEventStream;
}
