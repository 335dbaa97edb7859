//! A full drain cycle over HTTP: uploader, record store and collector client.

use std::sync::Arc;

use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crashbox_telemetry::{DrainOutcome, RecordStore, Uploader};

use crate::common::{self, SUBMIT_PATH};

#[tokio::test]
async fn test_drain_delivers_every_record() {
    let (server, client) = common::setup_collector().await;
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let bodies = common::seed_records(&store, 3);

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .and(query_param("mode", "stacktrace"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let uploader = Uploader::new(common::session(), store.clone(), Arc::new(client));
    let outcome = uploader.run().await;

    assert_eq!(
        outcome,
        DrainOutcome::Drained {
            delivered: 3,
            retained: 0
        }
    );
    assert!(store.list_pending().unwrap().is_empty());

    let received = server.received_requests().await.unwrap();
    let sent: Vec<Vec<u8>> = received.into_iter().map(|r| r.body).collect();
    assert_eq!(sent, bodies);
}

#[tokio::test]
async fn test_rejected_record_stays_for_next_start() {
    let (server, client) = common::setup_collector().await;
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let bodies = common::seed_records(&store, 3);

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .and(body_string_contains("fault 1"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    common::mount_submit(&server, "stacktrace", 200, "").await;

    let uploader = Uploader::new(common::session(), store.clone(), Arc::new(client));
    let outcome = uploader.run().await;

    assert_eq!(
        outcome,
        DrainOutcome::Drained {
            delivered: 2,
            retained: 1
        }
    );

    let left = store.list_pending().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(store.read(&left[0]).unwrap(), bodies[1]);
}

#[tokio::test]
async fn test_empty_store_pings_and_reads_advisory() {
    let (server, client) = common::setup_collector().await;
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .and(query_param("mode", "ping"))
        .and(body_string_contains("deviceIdentifier:device-7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("99999999"))
        .expect(1)
        .mount(&server)
        .await;

    let uploader = Uploader::new(common::session(), store.clone(), Arc::new(client));
    let outcome = uploader.run().await;

    assert_eq!(outcome, DrainOutcome::Heartbeat { acknowledged: true });
    assert!(uploader.advisor().has_advised());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
