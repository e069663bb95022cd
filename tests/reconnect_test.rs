//! Deterministic reconnect-loop tests using the mock transport and the
//! recording sleeper: backoff progression, failure classification,
//! resumption replay, and the error channel.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use frameline::adapters::{MockConnection, MockTransport, RecordingSleeper};
use frameline::traits::{Headers, RequestFactory, RequestOptions, TransportError};
use frameline::{
    ClientConfig, ClientEvent, FramelineClient, ListenerOptions, ERROR_CHANNEL,
};

/// Config with the clean-termination floor disabled so scripted streams can
/// end instantly and still count as completed.
fn fast_config() -> ClientConfig {
    let mut config = ClientConfig::new("http://test/stream");
    config.min_stream_duration = Duration::ZERO;
    config
}

fn start_client(
    config: ClientConfig,
    transport: &MockTransport,
) -> (FramelineClient, RecordingSleeper) {
    common::init_tracing();
    let sleeper = RecordingSleeper::new();
    let client = FramelineClient::with_parts(
        config,
        Arc::new(transport.clone()),
        Arc::new(sleeper.clone()),
        None,
    );
    (client, sleeper)
}

/// Collect error codes published on the reserved error channel.
fn collect_error_codes(client: &FramelineClient) -> Arc<Mutex<Vec<&'static str>>> {
    let codes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&codes);
    client.add_event_listener(
        ERROR_CHANNEL,
        move |event| {
            if let ClientEvent::Error(err) = event {
                sink.lock().unwrap().push(err.error_code());
            }
        },
        ListenerOptions::default(),
    );
    codes
}

async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(2) {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {}", what);
}

fn wire(frames: &[&str]) -> String {
    let mut s = frames.join("\n");
    s.push('\n');
    s
}

#[tokio::test]
async fn test_three_consecutive_failures_back_off_linearly() {
    let transport = MockTransport::new();
    for _ in 0..3 {
        transport.push_connection(MockConnection::Error(TransportError::ConnectionFailed(
            "refused".to_string(),
        )));
    }
    let (_client, sleeper) = start_client(fast_config(), &transport);

    wait_until("three cooldowns", || sleeper.delays().len() >= 3).await;

    assert_eq!(
        sleeper.delays()[..3],
        [
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(2)
        ]
    );
}

#[tokio::test]
async fn test_processed_record_resets_backoff() {
    let transport = MockTransport::new();
    // Two failures, then a stream with one good record, then another failure.
    transport.push_connection(MockConnection::Error(TransportError::ConnectionFailed(
        "refused".to_string(),
    )));
    transport.push_connection(MockConnection::Error(TransportError::ConnectionFailed(
        "refused".to_string(),
    )));
    transport.push_connection(MockConnection::chunks(&[&wire(&[
        r#"{"event":"x","data":"1"}"#,
    ])]));
    transport.push_connection(MockConnection::Error(TransportError::ConnectionFailed(
        "refused".to_string(),
    )));
    let (_client, sleeper) = start_client(fast_config(), &transport);

    wait_until("four delays", || sleeper.delays().len() >= 4).await;

    let delays = sleeper.delays();
    // Cooldowns 0s and 1s, the completed-stream reconnect delay, then a
    // cooldown back at 0s because the processed record reset the counter.
    assert_eq!(delays[0], Duration::ZERO);
    assert_eq!(delays[1], Duration::from_secs(1));
    assert_eq!(delays[2], Duration::from_millis(100));
    assert_eq!(delays[3], Duration::ZERO);
}

#[tokio::test]
async fn test_premature_termination_is_a_failure() {
    let transport = MockTransport::new();
    // Default 5s floor; the scripted stream ends immediately.
    transport.push_connection(MockConnection::chunks(&[&wire(&[
        r#"{"event":"x","data":"1"}"#,
    ])]));
    let config = ClientConfig::new("http://test/stream");
    let (client, sleeper) = start_client(config, &transport);
    let codes = collect_error_codes(&client);

    wait_until("premature disconnect error", || {
        codes.lock().unwrap().contains(&"E_PREMATURE_EOF")
    })
    .await;

    // The failure went through the cooldown path.
    assert!(!sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_clean_termination_past_floor_reconnects_quickly() {
    let transport = MockTransport::new();
    transport.push_connection(MockConnection::chunks(&[&wire(&[
        r#"{"event":"x","data":"1"}"#,
    ])]));
    let (client, sleeper) = start_client(fast_config(), &transport);
    let codes = collect_error_codes(&client);

    wait_until("completed reconnect", || !sleeper.delays().is_empty()).await;

    assert_eq!(sleeper.delays()[0], Duration::from_millis(100));
    assert!(codes.lock().unwrap().is_empty());
    // The follow-up attempt happened.
    wait_until("second attempt", || transport.request_count() >= 2).await;
}

#[tokio::test]
async fn test_tickets_replayed_on_next_attempt() {
    let transport = MockTransport::new();
    transport.push_connection(MockConnection::chunks(&[&wire(&[
        r#"{"id":"42","event":"x","data":"1"}"#,
        r#"{"id":"43","event":"x","data":"2"}"#,
        r#"{"event":"x","data":"3"}"#,
        r#"{"id":"7","event":"y","data":"4"}"#,
    ])]));
    let (_client, _sleeper) = start_client(fast_config(), &transport);

    wait_until("second attempt", || transport.request_count() >= 2).await;

    let requests = transport.requests();
    let first: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(first, serde_json::json!({"tickets": {}}));

    // "43" overwrote "42"; the id-less frame did not clear it.
    let second: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(second, serde_json::json!({"tickets": {"x": "43", "y": "7"}}));
}

#[tokio::test]
async fn test_content_type_is_always_forced() {
    let transport = MockTransport::new();
    let (_client, _sleeper) = start_client(fast_config(), &transport);

    wait_until("first attempt", || transport.request_count() >= 1).await;

    let requests = transport.requests();
    assert_eq!(
        requests[0].headers.get("Content-Type"),
        Some(&"application/json".to_string())
    );
}

#[tokio::test]
async fn test_decode_failure_aborts_connection() {
    let transport = MockTransport::new();
    // A brace-balanced but invalid record sits between two good frames; the
    // connection must abort at the bad record, never reaching "b".
    transport.push_connection(MockConnection::chunks(&[&wire(&[
        r#"{"event":"a","data":"1"}"#,
        r#"{not json}"#,
        r#"{"event":"b","data":"2"}"#,
    ])]));
    let (client, _sleeper) = start_client(fast_config(), &transport);
    let codes = collect_error_codes(&client);

    wait_until("decode error", || {
        codes.lock().unwrap().contains(&"E_DECODE")
    })
    .await;

    // "a" was processed before the abort, "b" was not.
    let a = tokio::time::timeout(Duration::from_secs(1), client.get_frame("a"))
        .await
        .expect("frame a should have been dispatched");
    assert_eq!(a, serde_json::json!(1));

    let b = tokio::time::timeout(Duration::from_millis(100), client.get_frame("b")).await;
    assert!(b.is_err(), "frame b must not survive the aborted connection");
}

struct BearerFactory;

#[async_trait]
impl RequestFactory for BearerFactory {
    async fn base_request(&self) -> Result<RequestOptions, TransportError> {
        let mut headers = Headers::new();
        headers.insert("Authorization".to_string(), "Bearer token-1".to_string());
        // Deliberately wrong; the client must override it.
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        Ok(RequestOptions { headers })
    }
}

struct FailingFactory;

#[async_trait]
impl RequestFactory for FailingFactory {
    async fn base_request(&self) -> Result<RequestOptions, TransportError> {
        Err(TransportError::Other("token refresh failed".to_string()))
    }
}

#[tokio::test]
async fn test_factory_headers_are_merged_but_overridden() {
    let transport = MockTransport::new();
    let sleeper = RecordingSleeper::new();
    let _client = FramelineClient::with_parts(
        fast_config(),
        Arc::new(transport.clone()),
        Arc::new(sleeper),
        Some(Arc::new(BearerFactory)),
    );

    wait_until("first attempt", || transport.request_count() >= 1).await;

    let requests = transport.requests();
    assert_eq!(
        requests[0].headers.get("Authorization"),
        Some(&"Bearer token-1".to_string())
    );
    assert_eq!(
        requests[0].headers.get("Content-Type"),
        Some(&"application/json".to_string())
    );
}

#[tokio::test]
async fn test_factory_failure_goes_through_the_error_channel() {
    let transport = MockTransport::new();
    let sleeper = RecordingSleeper::new();
    let client = FramelineClient::with_parts(
        fast_config(),
        Arc::new(transport.clone()),
        Arc::new(sleeper),
        Some(Arc::new(FailingFactory)),
    );
    let codes = collect_error_codes(&client);

    wait_until("factory error", || {
        codes.lock().unwrap().contains(&"E_TRANSPORT")
    })
    .await;

    // The attempt failed before the transport was reached.
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_non_success_status_is_published() {
    let transport = MockTransport::new();
    transport.push_connection(MockConnection::Error(TransportError::ServerError {
        status: 503,
        message: "unavailable".to_string(),
    }));
    let (client, _sleeper) = start_client(fast_config(), &transport);
    let codes = collect_error_codes(&client);

    wait_until("http status error", || {
        codes.lock().unwrap().contains(&"E_HTTP_STATUS")
    })
    .await;
}
