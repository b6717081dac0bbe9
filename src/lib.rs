//! # blobfetch
//!
//! An asynchronous binary-resource retrieval engine. It fetches a remote
//! payload over HTTP, exposes optional interception points at every lifecycle
//! stage, reports progress, classifies failures, and guarantees that the
//! caller's completion settles exactly once no matter which lifecycle path
//! (success, HTTP error, transport error, abort) fires first.
//!
//! A second, structurally identical primitive is the one-shot
//! render-and-capture operation: acquire a scoped compositing surface,
//! trigger an external asynchronous draw, wait for a single "rendered"
//! notification, copy the result, and guarantee cleanup exactly once even
//! when the notification source fires more than once.
//!
//! ## Features
//!
//! - **Lifecycle hooks**: optional callbacks at before-send,
//!   before-processing, start, progress, ready-state, and end stages; absence
//!   of a hook is a structural no-op
//! - **Exactly-once settlement**: repeated terminal events after the first
//!   are ignored, never a double resolution or a crash
//! - **Decoupled observation**: lifecycle events are published to an
//!   injected [`bus::EventBus`] without affecting control flow
//! - **Header composition**: caller overrides win over defaults, with
//!   null-suppression and `Accept` filtering applied at send time
//! - **Abortable**: in-flight retrievals observe an [`abort::AbortHandle`]
//!   between suspension points
//!
//! ## Quick Start
//!
//! ```no_run
//! use blobfetch::{HttpTransport, RetrievalExecutor, RetrievalHooks, RetrieverConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::new(RetrieverConfig::default())?);
//! let executor = RetrievalExecutor::new(transport);
//!
//! let payload = executor
//!     .retrieve(
//!         "https://example.com/blobs/1",
//!         "blob-1",
//!         &Default::default(),
//!         &RetrievalHooks::default(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into several core modules:
//!
//! - [`headers`] - Header composition and send-time filtering
//! - [`hooks`] - The optional lifecycle hook record
//! - [`transport`] - The transport seam and the reqwest-backed implementation
//! - [`retriever`] - The retrieval executor and error taxonomy
//! - [`bus`] - Fire-and-forget lifecycle event publication
//! - [`capture`] - One-shot orchestration and render capture
//! - [`abort`] - Cooperative abort signalling

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Cooperative abort signalling for in-flight retrievals
pub mod abort;

/// Fire-and-forget lifecycle event publication
pub mod bus;

/// One-shot orchestration and render capture
pub mod capture;

/// Retriever configuration
pub mod config;

/// Header composition and send-time filtering
pub mod headers;

/// Optional lifecycle hooks
pub mod hooks;

/// Retrieval execution and error taxonomy
pub mod retriever;

/// Transport seam and HTTP implementation
pub mod transport;

pub use abort::AbortHandle;
pub use bus::{BroadcastBus, EventBus, NullBus, RetrievalEvent};
pub use capture::one_shot::{run_one_shot, Notifications, OneShotError};
pub use capture::{
    capture_once, CaptureError, CapturedFrame, Compositor, DisplayProperties, Surface,
    SurfaceDescriptor,
};
pub use config::RetrieverConfig;
pub use headers::HeaderOverrides;
pub use hooks::{ProgressUpdate, RetrievalHooks};
pub use retriever::context::{Completion, RequestContext};
pub use retriever::{RetrievalError, RetrievalExecutor};
pub use transport::{
    HttpTransport, RawResponse, ReadyState, Transport, TransportEvent, TransportEventStream,
};
