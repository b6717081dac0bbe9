//! Retrieval execution.
//!
//! The executor drives one retrieval from issuance to terminal resolution:
//! it owns the [`context::RequestContext`], wires transport events to the
//! caller's hooks and to the event bus, and guarantees the completion settles
//! on exactly one of the success, HTTP-error, transport-error, or abort
//! paths. Whichever terminal event fires first wins; the settlement guard
//! makes all later ones no-ops.

use bytes::Bytes;

pub mod context;
pub mod executor;

pub use executor::RetrievalExecutor;

/// Classified retrieval failures.
///
/// Every failure tied to an issued request carries the `url` and
/// `resource_id` it belongs to, so callers collecting results from
/// concurrent retrievals can correlate a rejection without extra
/// bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The request reached the server but the response status signals
    /// failure.
    #[error("HTTP error retrieving '{resource_id}' from {url}: status {status}")]
    Http {
        /// Target resource locator.
        url: String,
        /// Logical identifier for the resource.
        resource_id: String,
        /// Response status code.
        status: u16,
        /// Raw response body for logging or custom handling.
        body: Bytes,
    },

    /// Local processing failed: connection, timeout, mid-body error, or a
    /// post-receipt transform failure after a nominally successful
    /// transmission.
    #[error("transport error retrieving '{resource_id}' from {url}: {cause}")]
    Transport {
        /// Target resource locator.
        url: String,
        /// Logical identifier for the resource.
        resource_id: String,
        /// Human-readable failure cause.
        cause: String,
    },

    /// The in-flight request was aborted.
    #[error("retrieval of '{resource_id}' from {url} aborted")]
    Aborted {
        /// Target resource locator.
        url: String,
        /// Logical identifier for the resource.
        resource_id: String,
    },

    /// The caller violated the request contract.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transport stream ended without anything settling the completion.
    /// Happens only when a delegated ready-state hook forgets to settle.
    #[error("retrieval of '{resource_id}' from {url} ended without settling the completion handle")]
    NeverSettled {
        /// Target resource locator.
        url: String,
        /// Logical identifier for the resource.
        resource_id: String,
    },
}

/// Result type for retrieval operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;
