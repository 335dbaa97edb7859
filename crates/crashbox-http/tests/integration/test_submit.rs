//! Request shape and response handling of `CollectorClient::send`.

use std::time::Duration;

use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crashbox_core::ports::{ITransport, UploadRequest};
use crashbox_http::client::{CollectorClient, TEXT_PLAIN_UTF8};

use crate::common::{self, SUBMIT_PATH};

#[tokio::test]
async fn test_stack_trace_is_posted_as_plain_text() {
    let (server, client) = common::setup_collector().await;
    let record = "monitorVersion:1\napiKey:k\n\npanic in thread 'main': boom\n";

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .and(query_param("mode", "stacktrace"))
        .and(header("content-type", TEXT_PLAIN_UTF8))
        .and(body_string(record))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .send(UploadRequest::stack_trace(record.as_bytes().to_vec()))
        .await
        .expect("send failed");

    assert_eq!(response.status, 200);
    assert!(response.is_acknowledged());
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_heartbeat_uses_ping_mode() {
    let (server, client) = common::setup_collector().await;
    common::mount_submit(&server, "ping", 200, "20261019").await;

    let response = client
        .send(UploadRequest::heartbeat("apiKey:tenant-42\n"))
        .await
        .expect("send failed");

    assert!(response.is_acknowledged());
    assert_eq!(response.body, "20261019");

    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body, b"apiKey:tenant-42\n");
}

#[tokio::test]
async fn test_non_200_status_is_reported_not_raised() {
    let (server, client) = common::setup_collector().await;
    common::mount_submit(&server, "stacktrace", 503, "busy").await;

    let response = client
        .send(UploadRequest::stack_trace(b"r".to_vec()))
        .await
        .expect("a non-200 status is still a response");

    assert_eq!(response.status, 503);
    assert_eq!(response.body, "busy");
    assert!(!response.is_acknowledged());
}

#[tokio::test]
async fn test_created_is_not_an_acknowledgement() {
    let (server, client) = common::setup_collector().await;
    common::mount_submit(&server, "stacktrace", 201, "").await;

    let response = client
        .send(UploadRequest::stack_trace(b"r".to_vec()))
        .await
        .unwrap();
    assert!(!response.is_acknowledged());
}

#[tokio::test]
async fn test_slow_collector_times_out() {
    let (server, _) = common::setup_collector().await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = CollectorClient::new(
        format!("{}{}", server.uri(), SUBMIT_PATH),
        Duration::from_millis(200),
    )
    .unwrap();

    let result = client.send(UploadRequest::heartbeat("apiKey:k\n")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_unreachable_collector_is_an_error() {
    // Nothing listens on the discard port
    let client =
        CollectorClient::new("http://127.0.0.1:9/submit", Duration::from_secs(2)).unwrap();

    let err = client
        .send(UploadRequest::stack_trace(b"r".to_vec()))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("stacktrace"));
}

#[tokio::test]
async fn test_truncated_body_still_acknowledges_200() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Promises 100 bytes of body, sends 7, then hangs up
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\npartial")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let client = CollectorClient::new(
        format!("http://{addr}{SUBMIT_PATH}"),
        Duration::from_secs(5),
    )
    .unwrap();
    let response = client
        .send(UploadRequest::stack_trace(b"apiKey:k\n\ntrace\n".to_vec()))
        .await
        .expect("a 200 with a broken body is still a response");

    assert!(response.is_acknowledged());
    assert!(response.body.is_empty());
    server.await.unwrap();
}
