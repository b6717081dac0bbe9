//! Optional lifecycle hooks.
//!
//! A hook record is a capability set: every field is optional, presence is
//! checked before invocation, absence is a structural no-op and never an
//! error. Hooks let callers override default behavior surgically (custom
//! progress UI, custom error reporting, protocol-specific response handling)
//! without forking the executor.

use crate::headers::HeaderOverrides;
use crate::retriever::context::{Completion, RequestContext};
use crate::retriever::RetrievalError;
use crate::transport::{RawResponse, ReadyState};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;

/// Error type produced by a before-processing transform.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

/// Last-mile header mutation before transmission. Receives the url, the
/// resource id, and the default headers; returns overrides merged over the
/// defaults (override wins).
pub type BeforeSendHook =
    Box<dyn Fn(&str, &str, &HeaderOverrides) -> HeaderOverrides + Send + Sync>;

/// Post-receipt transform applied to a successful raw response before the
/// completion resolves. Returns the payload bytes or a failure that the
/// executor classifies as a transport error.
pub type BeforeProcessingHook =
    Box<dyn Fn(RawResponse) -> BoxFuture<'static, Result<Bytes, TransformError>> + Send + Sync>;

/// Hook invoked with the request context at start and end stages.
pub type StageHook = Box<dyn Fn(&RequestContext) + Send + Sync>;

/// Hook invoked on each progress update.
pub type ProgressHook = Box<dyn Fn(&ProgressUpdate, &RequestContext) + Send + Sync>;

/// Hook that fully owns ready-state handling. When registered, the
/// executor's default terminal classification is skipped entirely and the
/// hook is solely responsible for settling the [`Completion`].
pub type ReadyStateHook = Box<dyn Fn(ReadyState, Option<&RawResponse>, &Completion) + Send + Sync>;

/// Observer offered every classified error before the completion rejects.
pub type ErrorInterceptor = Box<dyn Fn(&RetrievalError, &RequestContext) + Send + Sync>;

/// One progress observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Bytes received so far.
    pub loaded: u64,
    /// Total bytes when the length is computable.
    pub total: Option<u64>,
    /// `round(loaded / total * 100)`, only when the length is computable.
    pub percent_complete: Option<u8>,
}

/// Capability set of optional functions keyed by lifecycle stage.
#[derive(Default)]
pub struct RetrievalHooks {
    /// Last-mile header mutation, invoked before transmission.
    pub before_send: Option<BeforeSendHook>,
    /// Post-receipt transform for successful responses.
    pub before_processing: Option<BeforeProcessingHook>,
    /// Invoked when transmission starts.
    pub on_start: Option<StageHook>,
    /// Invoked on each progress update.
    pub on_progress: Option<ProgressHook>,
    /// Full delegation of ready-state handling, including settlement.
    pub on_ready_state: Option<ReadyStateHook>,
    /// Invoked when transmission ends, on every path.
    pub on_end: Option<StageHook>,
    /// Offered every classified error before rejection.
    pub error_interceptor: Option<ErrorInterceptor>,
}

impl RetrievalHooks {
    /// Create an empty hook record; every stage is a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the before-send header mutation hook.
    pub fn with_before_send<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &str, &HeaderOverrides) -> HeaderOverrides + Send + Sync + 'static,
    {
        self.before_send = Some(Box::new(hook));
        self
    }

    /// Set the before-processing transform.
    pub fn with_before_processing<F, Fut, E>(mut self, hook: F) -> Self
    where
        F: Fn(RawResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes, E>> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.before_processing = Some(Box::new(move |raw| {
            let fut = hook(raw);
            Box::pin(async move { fut.await.map_err(|e| Box::new(e) as TransformError) })
        }));
        self
    }

    /// Set the on-start hook.
    pub fn with_on_start<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestContext) + Send + Sync + 'static,
    {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Set the on-progress hook.
    pub fn with_on_progress<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ProgressUpdate, &RequestContext) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(hook));
        self
    }

    /// Delegate ready-state handling entirely to `hook`.
    ///
    /// The default success/failure classification is bypassed for the whole
    /// retrieval; the hook must settle the completion itself or the executor
    /// rejects with [`RetrievalError::NeverSettled`] once the transport
    /// stream ends.
    pub fn with_on_ready_state<F>(mut self, hook: F) -> Self
    where
        F: Fn(ReadyState, Option<&RawResponse>, &Completion) + Send + Sync + 'static,
    {
        self.on_ready_state = Some(Box::new(hook));
        self
    }

    /// Set the on-end hook.
    pub fn with_on_end<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestContext) + Send + Sync + 'static,
    {
        self.on_end = Some(Box::new(hook));
        self
    }

    /// Set the error interceptor.
    pub fn with_error_interceptor<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RetrievalError, &RequestContext) + Send + Sync + 'static,
    {
        self.error_interceptor = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for RetrievalHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalHooks")
            .field("before_send", &self.before_send.is_some())
            .field("before_processing", &self.before_processing.is_some())
            .field("on_start", &self.on_start.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_ready_state", &self.on_ready_state.is_some())
            .field("on_end", &self.on_end.is_some())
            .field("error_interceptor", &self.error_interceptor.is_some())
            .finish()
    }
}
