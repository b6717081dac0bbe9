//! The retrieval state machine.
//!
//! One `retrieve` call moves through Idle → Sent → Progressing* →
//! Terminal(Success | HttpError | TransportError | Aborted). Terminal is
//! absorbing: the event pump keeps draining the transport stream after
//! settlement so spurious terminal-shaped events are observed and ignored by
//! the completion guard instead of double-resolving or crashing.

use crate::abort::AbortHandle;
use crate::bus::{EventBus, NullBus, RetrievalEvent};
use crate::headers::{self, HeaderOverrides};
use crate::hooks::{ProgressUpdate, RetrievalHooks};
use crate::retriever::context::{Completion, RequestContext};
use crate::retriever::{RetrievalError, RetrievalResult};
use crate::transport::{RawResponse, ReadyState, Transport, TransportEvent};
use bytes::Bytes;
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Drives one retrieval from issuance to terminal resolution.
pub struct RetrievalExecutor {
    transport: Arc<dyn Transport>,
    bus: Arc<dyn EventBus>,
}

impl RetrievalExecutor {
    /// Create an executor over `transport` with no event observers.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            bus: Arc::new(NullBus),
        }
    }

    /// Publish lifecycle events to `bus`.
    pub fn with_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.bus = bus;
        self
    }

    /// Retrieve the payload at `url`.
    ///
    /// Builds the request context, composes headers (the optional
    /// before-send hook's overrides win over `default_headers`), issues the
    /// transmission, and pumps transport events through the hooks and the
    /// bus until the stream ends. The returned result is the completion's
    /// single settlement.
    pub async fn retrieve(
        &self,
        url: &str,
        resource_id: &str,
        default_headers: &HeaderOverrides,
        hooks: &RetrievalHooks,
    ) -> RetrievalResult<Bytes> {
        self.retrieve_with_abort(url, resource_id, default_headers, hooks, AbortHandle::new())
            .await
    }

    /// Like [`RetrievalExecutor::retrieve`], with a caller-held abort handle.
    pub async fn retrieve_with_abort(
        &self,
        url: &str,
        resource_id: &str,
        default_headers: &HeaderOverrides,
        hooks: &RetrievalHooks,
        abort: AbortHandle,
    ) -> RetrievalResult<Bytes> {
        if url.is_empty() {
            return Err(RetrievalError::InvalidRequest(
                "url must not be empty".to_string(),
            ));
        }

        let span = tracing::info_span!("retrieve", url = %url, resource_id = %resource_id);
        self.retrieve_inner(url, resource_id, default_headers, hooks, abort)
            .instrument(span)
            .await
    }

    async fn retrieve_inner(
        &self,
        url: &str,
        resource_id: &str,
        default_headers: &HeaderOverrides,
        hooks: &RetrievalHooks,
        abort: AbortHandle,
    ) -> RetrievalResult<Bytes> {
        let composed = match &hooks.before_send {
            Some(before_send) => {
                let overrides = before_send(url, resource_id, default_headers);
                headers::compose(default_headers, &overrides)
            }
            None => default_headers.clone(),
        };
        let sent_headers = headers::filter_for_send(url, &composed);

        let (completion, mut receiver) = Completion::channel();
        let context = RequestContext {
            url: url.to_string(),
            resource_id: resource_id.to_string(),
            headers: sent_headers.clone(),
            completion,
        };

        info!(header_count = sent_headers.len(), "issuing retrieval");

        let mut events = self.transport.issue(url, sent_headers, abort).await;
        while let Some(event) = events.next().await {
            self.dispatch(event, &context, hooks).await;
        }

        // try_recv rather than await: the context still holds the sender, so
        // awaiting would hang forever when nothing settled.
        match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(_) => {
                // The stream ended without anything settling the completion.
                // A delegated ready-state hook that forgets to settle would
                // otherwise leave the caller pending forever.
                warn!("transport stream ended without settlement");
                let error = RetrievalError::NeverSettled {
                    url: context.url.clone(),
                    resource_id: context.resource_id.clone(),
                };
                if let Some(interceptor) = &hooks.error_interceptor {
                    interceptor(&error, &context);
                }
                Err(error)
            }
        }
    }

    async fn dispatch(
        &self,
        event: TransportEvent,
        context: &RequestContext,
        hooks: &RetrievalHooks,
    ) {
        match event {
            TransportEvent::Start => {
                if let Some(on_start) = &hooks.on_start {
                    on_start(context);
                }
                self.bus.publish(RetrievalEvent::Started {
                    url: context.url.clone(),
                    resource_id: context.resource_id.clone(),
                });
            }
            TransportEvent::Progress { loaded, total } => {
                let percent_complete = total
                    .filter(|t| *t > 0)
                    .map(|t| ((loaded as f64 / t as f64) * 100.0).round() as u8);
                let update = ProgressUpdate {
                    loaded,
                    total,
                    percent_complete,
                };
                if let Some(on_progress) = &hooks.on_progress {
                    on_progress(&update, context);
                }
                self.bus.publish(RetrievalEvent::Progress {
                    url: context.url.clone(),
                    resource_id: context.resource_id.clone(),
                    loaded,
                    total,
                    percent_complete,
                });
            }
            TransportEvent::ReadyState { state, response } => {
                if let Some(on_ready_state) = &hooks.on_ready_state {
                    // Full delegation: the hook owns resolution for this
                    // retrieval and the default classification is skipped.
                    on_ready_state(state, response.as_ref(), &context.completion);
                    return;
                }
                if state == ReadyState::Done {
                    if let Some(raw) = response {
                        self.finish(raw, context, hooks).await;
                    }
                }
            }
            TransportEvent::End => {
                if let Some(on_end) = &hooks.on_end {
                    on_end(context);
                }
                self.bus.publish(RetrievalEvent::Ended {
                    url: context.url.clone(),
                    resource_id: context.resource_id.clone(),
                });
            }
            TransportEvent::Error { cause } => {
                self.fail(
                    RetrievalError::Transport {
                        url: context.url.clone(),
                        resource_id: context.resource_id.clone(),
                        cause,
                    },
                    context,
                    hooks,
                );
            }
            TransportEvent::Abort => {
                self.fail(
                    RetrievalError::Aborted {
                        url: context.url.clone(),
                        resource_id: context.resource_id.clone(),
                    },
                    context,
                    hooks,
                );
            }
        }
    }

    /// Default terminal handling for a completed response.
    async fn finish(&self, raw: RawResponse, context: &RequestContext, hooks: &RetrievalHooks) {
        if raw.is_success() {
            let processed = match &hooks.before_processing {
                Some(transform) => transform(raw).await.map_err(|e| RetrievalError::Transport {
                    url: context.url.clone(),
                    resource_id: context.resource_id.clone(),
                    cause: e.to_string(),
                }),
                None => Ok(raw.body),
            };
            match processed {
                Ok(payload) => {
                    if context.completion.resolve(payload) {
                        debug!("retrieval resolved");
                    } else {
                        debug!("completion already settled; success ignored");
                    }
                }
                Err(error) => self.fail(error, context, hooks),
            }
        } else {
            self.fail(
                RetrievalError::Http {
                    url: context.url.clone(),
                    resource_id: context.resource_id.clone(),
                    status: raw.status,
                    body: raw.body,
                },
                context,
                hooks,
            );
        }
    }

    /// Offer `error` to the interceptor, then reject. Rejection after
    /// settlement is a no-op by the completion guard.
    fn fail(&self, error: RetrievalError, context: &RequestContext, hooks: &RetrievalHooks) {
        if let Some(interceptor) = &hooks.error_interceptor {
            interceptor(&error, context);
        }
        if !context.completion.reject(error) {
            debug!("terminal event after settlement ignored");
        }
    }
}
