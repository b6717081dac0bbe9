//! End-to-end retrievals over real HTTP against a mock server.

use blobfetch::{
    AbortHandle, BroadcastBus, EventBus, HttpTransport, ReadyState, RetrievalError,
    RetrievalEvent, RetrievalExecutor, RetrievalHooks, RetrieverConfig, Transport, TransportEvent,
};
use bytes::Bytes;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor_for(bus: Option<Arc<BroadcastBus>>) -> RetrievalExecutor {
    let transport = Arc::new(HttpTransport::new(RetrieverConfig::default()).unwrap());
    let executor = RetrievalExecutor::new(transport);
    match bus {
        Some(bus) => executor.with_bus(bus as Arc<dyn EventBus>),
        None => executor,
    }
}

#[tokio::test]
async fn test_success_resolves_with_payload_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blobs/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xAA, 0xBB]))
        .mount(&server)
        .await;

    let executor = executor_for(None);
    let payload = executor
        .retrieve(
            &format!("{}/blobs/1", server.uri()),
            "img1",
            &HashMap::new(),
            &RetrievalHooks::default(),
        )
        .await
        .unwrap();

    assert_eq!(payload, Bytes::from_static(&[0xAA, 0xBB]));
}

#[tokio::test]
async fn test_http_failure_rejects_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blobs/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_bytes(b"gone".to_vec()))
        .mount(&server)
        .await;

    let executor = executor_for(None);
    let target = format!("{}/blobs/missing", server.uri());
    let error = executor
        .retrieve(&target, "img1", &HashMap::new(), &RetrievalHooks::default())
        .await
        .unwrap_err();

    // The rejection itself carries enough context to correlate concurrent
    // retrievals, not just the status.
    match error {
        RetrievalError::Http {
            url,
            resource_id,
            status,
            body,
        } => {
            assert_eq!(url, target);
            assert_eq!(resource_id, "img1");
            assert_eq!(status, 404);
            assert_eq!(body, Bytes::from_static(b"gone"));
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_composed_headers_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blobs/1"))
        .and(header("Accept", "application/octet-stream"))
        .and(header("X-Request-Source", "test"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x01]))
        .expect(1)
        .mount(&server)
        .await;

    let mut defaults = HashMap::new();
    defaults.insert("Accept".to_string(), Some("image/png".to_string()));

    // The before-send hook overrides the default Accept and adds a header.
    let hooks = RetrievalHooks::new().with_before_send(|_url, _resource_id, _defaults| {
        let mut overrides = HashMap::new();
        overrides.insert(
            "Accept".to_string(),
            Some("application/octet-stream".to_string()),
        );
        overrides.insert("X-Request-Source".to_string(), Some("test".to_string()));
        overrides
    });

    let executor = executor_for(None);
    executor
        .retrieve(&format!("{}/blobs/1", server.uri()), "img1", &defaults, &hooks)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_lifecycle_events_are_published_in_order() {
    let server = MockServer::start().await;
    let body = vec![0x42u8; 4096];
    Mock::given(method("GET"))
        .and(path("/blobs/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let bus = Arc::new(BroadcastBus::new());
    let mut events = bus.subscribe();
    let executor = executor_for(Some(bus));
    let payload = executor
        .retrieve(
            &format!("{}/blobs/1", server.uri()),
            "img1",
            &HashMap::new(),
            &RetrievalHooks::default(),
        )
        .await
        .unwrap();
    assert_eq!(payload.len(), body.len());

    let mut observed = Vec::new();
    while let Ok(event) = events.try_recv() {
        observed.push(event);
    }

    assert!(matches!(observed.first(), Some(RetrievalEvent::Started { .. })));
    assert!(matches!(observed.last(), Some(RetrievalEvent::Ended { .. })));

    // Progress is monotonic and ends at the full, computable length.
    let mut last_loaded = 0;
    let mut last_percent = None;
    for event in &observed {
        if let RetrievalEvent::Progress {
            loaded,
            total,
            percent_complete,
            url,
            resource_id,
        } = event
        {
            assert_eq!(url, &format!("{}/blobs/1", server.uri()));
            assert_eq!(resource_id, "img1");
            assert!(*loaded >= last_loaded);
            assert_eq!(*total, Some(body.len() as u64));
            last_loaded = *loaded;
            last_percent = *percent_complete;
        }
    }
    assert_eq!(last_loaded, body.len() as u64);
    assert_eq!(last_percent, Some(100));
}

#[tokio::test]
async fn test_transport_ready_states_are_monotonic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blobs/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x01]))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(RetrieverConfig::default()).unwrap();
    let events: Vec<TransportEvent> = transport
        .issue(
            &format!("{}/blobs/1", server.uri()),
            Vec::new(),
            AbortHandle::new(),
        )
        .await
        .collect()
        .await;

    let states: Vec<ReadyState> = events
        .iter()
        .filter_map(|event| match event {
            TransportEvent::ReadyState { state, .. } => Some(*state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            ReadyState::Opened,
            ReadyState::HeadersReceived,
            ReadyState::Loading,
            ReadyState::Done,
        ]
    );
    assert!(matches!(
        events.first(),
        Some(TransportEvent::ReadyState {
            state: ReadyState::Opened,
            ..
        })
    ));
    assert_eq!(events.get(1), Some(&TransportEvent::Start));
    assert_eq!(events.last(), Some(&TransportEvent::End));
}

#[tokio::test]
async fn test_error_interceptor_observes_http_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blobs/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let intercepted = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = intercepted.clone();
    let hooks = RetrievalHooks::new().with_error_interceptor(move |error, context| {
        sink.lock()
            .unwrap()
            .push((error.to_string(), context.resource_id.clone()));
    });

    let executor = executor_for(None);
    let error = executor
        .retrieve(
            &format!("{}/blobs/1", server.uri()),
            "img1",
            &HashMap::new(),
            &hooks,
        )
        .await
        .unwrap_err();

    assert!(matches!(error, RetrievalError::Http { status: 500, .. }));
    let intercepted = intercepted.lock().unwrap();
    assert_eq!(intercepted.len(), 1);
    assert_eq!(intercepted[0].1, "img1");
}
