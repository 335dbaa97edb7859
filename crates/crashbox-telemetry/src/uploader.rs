//! Record delivery
//!
//! One [`Uploader::run`] is one drain cycle: enumerate the store, send each
//! record, delete it only on a 200. When nothing is pending a heartbeat goes
//! out instead. Nothing here is retried in-process; whatever is left behind
//! is picked up by the next start.

use std::sync::Arc;

use crashbox_core::domain::{now_millis, SessionContext};
use crashbox_core::ports::{ITransport, UploadRequest};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::advisory::VersionAdvisor;
use crate::store::{RecordHandle, RecordStore, StoreError};

/// Result of one drain cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DrainOutcome {
    /// The store could not be enumerated; nothing was sent.
    Aborted,
    /// The store was empty and a heartbeat was sent.
    Heartbeat { acknowledged: bool },
    /// Pending records were sent. `retained` stay for the next run.
    Drained { delivered: usize, retained: usize },
}

pub struct Uploader {
    context: Arc<SessionContext>,
    store: RecordStore,
    transport: Arc<dyn ITransport>,
    advisor: Arc<VersionAdvisor>,
}

impl Uploader {
    pub fn new(
        context: Arc<SessionContext>,
        store: RecordStore,
        transport: Arc<dyn ITransport>,
    ) -> Self {
        Self {
            context,
            store,
            transport,
            advisor: Arc::new(VersionAdvisor::default()),
        }
    }

    /// Shares an advisor across uploaders so the advisory stays one-time.
    pub fn with_advisor(mut self, advisor: Arc<VersionAdvisor>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn advisor(&self) -> &VersionAdvisor {
        &self.advisor
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Runs one drain cycle. Never fails; the outcome says what happened.
    #[instrument(skip(self), fields(dir = %self.store.dir().display()))]
    pub async fn run(&self) -> DrainOutcome {
        let pending = match self.on_store(|store| store.list_pending()).await {
            Ok(pending) => pending,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Cannot enumerate crash records; retrying on next start");
                return DrainOutcome::Aborted;
            }
        };

        if pending.is_empty() {
            debug!("No pending crash records");
            return self.send_heartbeat().await;
        }

        info!(count = pending.len(), "Uploading pending crash records");

        let mut delivered = 0;
        let mut retained = 0;
        for handle in &pending {
            if self.deliver(handle).await {
                delivered += 1;
            } else {
                retained += 1;
            }
        }

        info!(delivered, retained, "Crash record upload finished");
        DrainOutcome::Drained {
            delivered,
            retained,
        }
    }

    /// Sends one heartbeat built from the session context.
    #[instrument(skip(self))]
    pub async fn send_heartbeat(&self) -> DrainOutcome {
        let body = self.context.heartbeat(now_millis());

        match self.transport.send(UploadRequest::heartbeat(body)).await {
            Ok(response) => {
                self.advisor.inspect(&response.body);
                let acknowledged = response.is_acknowledged();
                if acknowledged {
                    debug!("Heartbeat acknowledged");
                } else {
                    warn!(status = response.status, "Heartbeat not acknowledged");
                }
                DrainOutcome::Heartbeat { acknowledged }
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to send heartbeat");
                DrainOutcome::Heartbeat {
                    acknowledged: false,
                }
            }
        }
    }

    /// Sends one record and deletes it on acknowledgement.
    ///
    /// Returns `true` once the collector has acknowledged it.
    pub async fn deliver(&self, handle: &RecordHandle) -> bool {
        let target = handle.clone();
        let body = match self.on_store(move |store| store.read(&target)).await {
            Ok(body) => body,
            Err(e) => {
                warn!(record = %handle.name, error = %format!("{e:#}"), "Cannot read crash record, keeping it");
                return false;
            }
        };

        let response = match self.transport.send(UploadRequest::stack_trace(body)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    record = %handle.name,
                    error = %format!("{e:#}"),
                    "Failed to send crash record, keeping it"
                );
                return false;
            }
        };

        self.advisor.inspect(&response.body);

        if !response.is_acknowledged() {
            warn!(
                record = %handle.name,
                status = response.status,
                "Collector did not acknowledge crash record, keeping it"
            );
            return false;
        }

        let target = handle.clone();
        match self.on_store(move |store| store.delete(&target)).await {
            Ok(()) => debug!(record = %handle.name, "Crash record delivered"),
            Err(e) => warn!(
                record = %handle.name,
                error = %format!("{e:#}"),
                "Crash record delivered but not deleted; it will be sent again"
            ),
        }
        true
    }

    /// Runs a filesystem operation on the blocking pool.
    async fn on_store<T, F>(&self, op: F) -> anyhow::Result<T>
    where
        F: FnOnce(&RecordStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        Ok(tokio::task::spawn_blocking(move || op(&store)).await??)
    }
}
