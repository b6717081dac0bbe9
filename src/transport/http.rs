//! reqwest-backed transport.
//!
//! Issues the request eagerly, then drives body transfer as an unfolded
//! event stream: an `Opened` ready-state, `Start`, header/loading
//! ready-states, one `Progress` per received chunk, `Done` with the full
//! response snapshot, and a final `End`. Abort is observed between
//! suspension points and wins over further body reads.

use crate::abort::AbortHandle;
use crate::config::RetrieverConfig;
use crate::transport::{RawResponse, ReadyState, Transport, TransportEvent, TransportEventStream};
use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::stream;
use reqwest::{Client, Response};
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP transport built on a shared [`reqwest::Client`].
pub struct HttpTransport {
    client: Arc<Client>,
    config: RetrieverConfig,
}

impl HttpTransport {
    /// Build a transport with its own client configured from `config`.
    pub fn new(config: RetrieverConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Build a transport around an existing shared client.
    pub fn with_client(client: Arc<Client>, config: RetrieverConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn issue(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
        abort: AbortHandle,
    ) -> TransportEventStream {
        if abort.is_aborted() {
            return terminal_only(TransportEvent::Abort);
        }

        let mut request = self
            .client
            .get(url)
            .timeout(self.config.request_timeout);
        for (name, value) in &headers {
            request = request.header(name, value);
        }

        debug!(url = %url, header_count = headers.len(), "issuing request");

        let response = tokio::select! {
            _ = abort.aborted() => {
                debug!(url = %url, "aborted before response headers");
                return terminal_only(TransportEvent::Abort);
            }
            sent = request.send() => match sent {
                Ok(response) => response,
                Err(e) => {
                    warn!(url = %url, error = %e, "request failed to send");
                    return terminal_only(TransportEvent::Error {
                        cause: e.to_string(),
                    });
                }
            },
        };

        let pump = Pump {
            status: response.status().as_u16(),
            headers: response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect(),
            total: response.content_length(),
            response: Some(response),
            collected: BytesMut::new(),
            loaded: 0,
            abort,
            phase: Phase::Opened,
        };

        Box::pin(stream::unfold(pump, |mut pump| async move {
            let event = pump.step().await?;
            Some((event, pump))
        }))
    }
}

/// Stream that emits one terminal-shaped event followed by `End`.
fn terminal_only(event: TransportEvent) -> TransportEventStream {
    Box::pin(stream::iter(vec![event, TransportEvent::End]))
}

enum Phase {
    Opened,
    Start,
    Headers,
    Loading,
    Body,
    End,
    Finished,
}

struct Pump {
    status: u16,
    headers: Vec<(String, String)>,
    total: Option<u64>,
    response: Option<Response>,
    collected: BytesMut,
    loaded: u64,
    abort: AbortHandle,
    phase: Phase,
}

impl Pump {
    async fn step(&mut self) -> Option<TransportEvent> {
        match self.phase {
            Phase::Opened => {
                self.phase = Phase::Start;
                Some(TransportEvent::ReadyState {
                    state: ReadyState::Opened,
                    response: None,
                })
            }
            Phase::Start => {
                self.phase = Phase::Headers;
                Some(TransportEvent::Start)
            }
            Phase::Headers => {
                self.phase = Phase::Loading;
                Some(TransportEvent::ReadyState {
                    state: ReadyState::HeadersReceived,
                    response: None,
                })
            }
            Phase::Loading => {
                self.phase = Phase::Body;
                Some(TransportEvent::ReadyState {
                    state: ReadyState::Loading,
                    response: None,
                })
            }
            Phase::Body => Some(self.read_body().await),
            Phase::End => {
                self.phase = Phase::Finished;
                Some(TransportEvent::End)
            }
            Phase::Finished => None,
        }
    }

    async fn read_body(&mut self) -> TransportEvent {
        if self.abort.is_aborted() {
            self.phase = Phase::End;
            return TransportEvent::Abort;
        }

        let abort = self.abort.clone();
        let response = match self.response.as_mut() {
            Some(response) => response,
            None => {
                // Body phase without a response cannot happen; treat it as a
                // transport failure rather than panicking.
                self.phase = Phase::End;
                return TransportEvent::Error {
                    cause: "response missing during body transfer".to_string(),
                };
            }
        };

        tokio::select! {
            _ = abort.aborted() => {
                debug!(loaded = self.loaded, "aborted during body transfer");
                self.phase = Phase::End;
                TransportEvent::Abort
            }
            chunk = response.chunk() => match chunk {
                Ok(Some(bytes)) => {
                    self.loaded += bytes.len() as u64;
                    self.collected.extend_from_slice(&bytes);
                    TransportEvent::Progress {
                        loaded: self.loaded,
                        total: self.total,
                    }
                }
                Ok(None) => {
                    debug!(
                        status = self.status,
                        loaded = self.loaded,
                        "body transfer complete"
                    );
                    self.phase = Phase::End;
                    self.response = None;
                    TransportEvent::ReadyState {
                        state: ReadyState::Done,
                        response: Some(RawResponse {
                            status: self.status,
                            headers: std::mem::take(&mut self.headers),
                            body: std::mem::take(&mut self.collected).freeze(),
                        }),
                    }
                }
                Err(e) => {
                    warn!(loaded = self.loaded, error = %e, "body transfer failed");
                    self.phase = Phase::End;
                    self.response = None;
                    TransportEvent::Error {
                        cause: e.to_string(),
                    }
                }
            },
        }
    }
}
