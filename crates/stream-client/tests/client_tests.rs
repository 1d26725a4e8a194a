//! Client behaviour against a mock stream server.
//!
//! The server knows three streams: `locked` answers 409 to everything,
//! `not-found` answers 404, and `unlocked` accepts the request.
//!
//! Run with: cargo test --package stream-client --test client_tests

use serde_json::json;
use std::time::{Duration, Instant};
use stream_client::{
    AbortReason, CallOptions, CancellationToken, ClientConfig, ClientError, StreamClient,
    StreamConfiguration, EXPECTED_VERSION,
};
use wiremock::matchers::{basic_auth, body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_server() -> MockServer {
    let server = MockServer::start().await;

    for verb in ["PUT", "POST", "GET"] {
        Mock::given(method(verb))
            .and(path("/streams/locked"))
            .respond_with(ResponseTemplate::new(409).set_body_string("stream is locked"))
            .mount(&server)
            .await;
    }

    for verb in ["POST", "GET"] {
        Mock::given(method(verb))
            .and(path("/streams/not-found"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
    }

    Mock::given(method("PUT"))
        .and(path("/streams/unlocked"))
        .and(header("accept-version", EXPECTED_VERSION))
        .and(body_json(json!({ "timeToLive": null })))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/streams/unlocked"))
        .and(header("accept-version", EXPECTED_VERSION))
        .and(header("content-type", "application/octet-stream"))
        .and(body_string("data"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/streams/unlocked"))
        .and(header("accept-version", EXPECTED_VERSION))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(b"data".to_vec()),
        )
        .mount(&server)
        .await;

    server
}

fn create_client(server: &MockServer) -> StreamClient {
    StreamClient::new(ClientConfig::new(server.uri())).unwrap()
}

fn persistent() -> StreamConfiguration {
    StreamConfiguration::persistent()
}

// ==================== createStream ====================

#[tokio::test]
async fn test_create_locked() {
    let server = spawn_server().await;
    let client = create_client(&server);

    let err = client
        .create_stream("locked", &persistent(), CallOptions::default())
        .await
        .unwrap_err();

    match err {
        ClientError::StreamLocked { message } => {
            assert_eq!(message.as_deref(), Some("stream is locked"))
        }
        other => panic!("Expected StreamLocked, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_unlocked() {
    let server = spawn_server().await;
    let client = create_client(&server);

    client
        .create_stream("unlocked", &persistent(), CallOptions::default())
        .await
        .unwrap();
}

// ==================== writeStream ====================

#[tokio::test]
async fn test_write_not_found() {
    let server = spawn_server().await;
    let client = create_client(&server);

    let err = client
        .write_stream("not-found", "data", CallOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_write_locked() {
    let server = spawn_server().await;
    let client = create_client(&server);

    let err = client
        .write_stream("locked", "data", CallOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_locked(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_write_unlocked() {
    let server = spawn_server().await;
    let client = create_client(&server);

    client
        .write_stream("unlocked", "data", CallOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_write_unlocked_from_reader() {
    let server = spawn_server().await;
    let client = create_client(&server);

    client
        .write_stream(
            "unlocked",
            stream_client::Body::reader(&b"data"[..]),
            CallOptions::default(),
        )
        .await
        .unwrap();
}

// ==================== readStream ====================

#[tokio::test]
async fn test_read_not_found() {
    let server = spawn_server().await;
    let client = create_client(&server);

    let err = client
        .read_stream("not-found", CallOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_read_locked() {
    let server = spawn_server().await;
    let client = create_client(&server);

    let err = client
        .read_stream("locked", CallOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_locked(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_read_unlocked() {
    let server = spawn_server().await;
    let client = create_client(&server);

    let stream = client
        .read_stream("unlocked", CallOptions::default())
        .await
        .unwrap();

    assert_eq!(stream.collect_bytes().await.unwrap(), "data".as_bytes());
}

// ==================== Request composition ====================

#[tokio::test]
async fn test_basic_auth_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams/private"))
        .and(basic_auth("alice", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        StreamClient::new(ClientConfig::new(server.uri()).with_basic_auth("alice", "secret")).unwrap();
    let data = client
        .read_stream("private", CallOptions::default())
        .await
        .unwrap()
        .collect_bytes()
        .await
        .unwrap();

    assert_eq!(data, "ok".as_bytes());
}

#[tokio::test]
async fn test_keepalive_is_sent_as_connection_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams/kept"))
        .and(header("connection", "keep-alive"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        StreamClient::new(ClientConfig::new(server.uri()).with_keepalive(true)).unwrap();
    let data = client
        .read_stream("kept", CallOptions::default())
        .await
        .unwrap()
        .collect_bytes()
        .await
        .unwrap();

    assert_eq!(data, "ok".as_bytes());
}

#[tokio::test]
async fn test_call_keepalive_overrides_client_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams/kept"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        StreamClient::new(ClientConfig::new(server.uri()).with_keepalive(true)).unwrap();
    client
        .read_stream("kept", CallOptions::new().with_keepalive(false))
        .await
        .unwrap()
        .collect_bytes()
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].headers.get("connection").is_none(),
        "unexpected headers: {:?}",
        requests[0].headers
    );
}

#[tokio::test]
async fn test_unexpected_status_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = create_client(&server)
        .read_stream("broken", CallOptions::default())
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message.as_deref(), Some("boom"));
        }
        other => panic!("Expected Status, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_failure_passes_through() {
    // nothing listens on a port that was just released
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = StreamClient::new(ClientConfig::new(uri))
        .unwrap()
        .read_stream("unlocked", CallOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Http(_)), "unexpected error: {:?}", err);
}

// ==================== Cancellation ====================

async fn spawn_slow_server(delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(delay))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_client_timeout_aborts() {
    let server = spawn_slow_server(Duration::from_secs(5)).await;
    let client = StreamClient::new(
        ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let err = client
        .read_stream("slow", CallOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Aborted(AbortReason::Timeout)));
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_call_timeout_overrides_client_timeout() {
    let server = spawn_slow_server(Duration::from_secs(5)).await;
    let client = StreamClient::new(
        ClientConfig::new(server.uri()).with_timeout(Duration::from_secs(30)),
    )
    .unwrap();

    let start = Instant::now();
    let err = client
        .read_stream("slow", CallOptions::new().with_timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_disabled_timeout_waits_for_caller_token() {
    let server = spawn_slow_server(Duration::from_secs(5)).await;
    let client = StreamClient::new(
        ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let err = client
        .read_stream("slow", CallOptions::new().with_signal(token).without_timeout())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Aborted(AbortReason::Caller)), "unexpected error: {:?}", err);
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_cancelled_token_aborts_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    token.cancel();

    let err = create_client(&server)
        .create_stream("unlocked", &persistent(), CallOptions::new().with_signal(token))
        .await
        .unwrap_err();

    assert!(err.is_aborted());
}
