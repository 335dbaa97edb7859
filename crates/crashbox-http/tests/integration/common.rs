//! Shared test helpers for collector integration tests
//!
//! Provides a wiremock collector and fixtures for the session and stored
//! records the uploader works on.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crashbox_core::domain::{ApiKey, AppVersion, DisplayGeometry, SessionContext};
use crashbox_http::client::CollectorClient;
use crashbox_telemetry::RecordStore;

/// Path the mock collector listens on.
pub const SUBMIT_PATH: &str = "/submit";

/// Starts a mock collector and returns a client pointing at it.
///
/// No endpoints are mounted; each test mounts what it needs.
pub async fn setup_collector() -> (MockServer, CollectorClient) {
    let server = MockServer::start().await;
    let client = CollectorClient::new(
        format!("{}{}", server.uri(), SUBMIT_PATH),
        Duration::from_secs(5),
    )
    .expect("build collector client");
    (server, client)
}

/// Mounts `POST /submit?mode=<mode>` answering with `status` and `body`.
pub async fn mount_submit(server: &MockServer, mode: &str, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .and(query_param("mode", mode))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

pub fn session() -> Arc<SessionContext> {
    Arc::new(
        SessionContext::new(
            ApiKey::new("tenant-42").expect("api key"),
            AppVersion::new("1.4.2", 42).expect("app version"),
            DisplayGeometry::new(1080, 1920),
        )
        .with_device_identifier(Some("device-7".to_string())),
    )
}

/// Writes `count` records captured at 1000, 1001, ... and returns their bytes.
pub fn seed_records(store: &RecordStore, count: i64) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            let body = session()
                .record(1_000 + i, format!("panic in thread 'main': fault {i}\n"))
                .to_wire()
                .into_bytes();
            store.write(1_000 + i, &body).expect("seed record");
            body
        })
        .collect()
}
