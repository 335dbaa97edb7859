//! Initialization entry point
//!
//! [`Monitor::initialize`] wires the pipeline together for a host process:
//! resolve metadata, build the session context, install the crash recorder
//! over the current panic hook, and start exactly one drain of records left
//! by earlier sessions.

use std::error::Error;
use std::sync::Arc;

use crashbox_core::domain::{ApiKey, DomainError, SessionContext};
use crashbox_core::ports::{IHostEnvironment, ITransport};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::recorder::{install, CrashRecorder, PanicHookChain};
use crate::store::{RecordHandle, RecordStore, StoreError};
use crate::uploader::{DrainOutcome, Uploader};

/// Errors that prevent the monitor from being installed
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("couldn't determine version: {0}")]
    HostMetadata(#[source] Box<dyn Error + Send + Sync + 'static>),

    #[error(transparent)]
    InvalidApiKey(#[from] DomainError),
}

/// The single background drain run of a process
///
/// Runs on the ambient Tokio runtime when there is one, otherwise on a
/// dedicated thread with its own current-thread runtime. Dropping the task
/// does not cancel the drain.
#[derive(Debug)]
pub struct DrainTask {
    outcome: oneshot::Receiver<DrainOutcome>,
}

impl DrainTask {
    pub fn spawn(uploader: Uploader) -> Self {
        let (tx, rx) = oneshot::channel();
        let work = async move {
            let outcome = uploader.run().await;
            let _ = tx.send(outcome);
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(work);
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name("crashbox-drain".to_string())
                    .spawn(move || {
                        match tokio::runtime::Builder::new_current_thread()
                            .enable_all()
                            .build()
                        {
                            Ok(runtime) => runtime.block_on(work),
                            Err(e) => error!(error = %e, "Cannot start runtime for crash record upload"),
                        }
                    });
                if let Err(e) = spawned {
                    error!(error = %e, "Cannot start crash record upload thread");
                }
            }
        }

        Self { outcome: rx }
    }

    /// Waits for the drain to finish. `None` if it never ran to completion.
    pub async fn outcome(self) -> Option<DrainOutcome> {
        self.outcome.await.ok()
    }

    /// Blocking form of [`DrainTask::outcome`]. Must not be called from
    /// inside an async context.
    pub fn blocking_outcome(self) -> Option<DrainOutcome> {
        self.outcome.blocking_recv().ok()
    }
}

/// An installed crash monitor
pub struct Monitor {
    context: Arc<SessionContext>,
    recorder: Arc<CrashRecorder<PanicHookChain>>,
    drain: Option<DrainTask>,
}

impl Monitor {
    /// Installs the crash recorder and starts the startup drain.
    ///
    /// Every panic in the process is recorded from here on, including ones
    /// the host later catches.
    ///
    /// Nothing is installed if the host cannot report its version or the API
    /// key is unusable.
    pub fn initialize(
        host: &dyn IHostEnvironment,
        api_key: &str,
        device_identifier: Option<String>,
        transport: Arc<dyn ITransport>,
    ) -> Result<Self, MonitorError> {
        let app_version = host.app_version().map_err(|e| {
            error!(error = %format!("{e:#}"), "Couldn't determine version, crash monitor not installed");
            MonitorError::HostMetadata(e.into())
        })?;
        let api_key = ApiKey::new(api_key).map_err(|e| {
            error!(error = %e, "Crash monitor not installed");
            e
        })?;

        let context = Arc::new(
            SessionContext::new(api_key, app_version, host.display_geometry())
                .with_device_identifier(device_identifier),
        );
        let store = RecordStore::new(host.storage_dir());

        let recorder = install(
            Arc::clone(&context),
            store.clone(),
            std::panic::take_hook(),
        );
        let drain = DrainTask::spawn(Uploader::new(Arc::clone(&context), store, transport));

        info!(
            version = %context.app_version(),
            display = %context.display(),
            "Crash monitor initialized"
        );

        Ok(Self {
            context,
            recorder,
            drain: Some(drain),
        })
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn recorder(&self) -> &CrashRecorder<PanicHookChain> {
        &self.recorder
    }

    /// Persists a fatal error the host handled itself.
    pub fn record_error<E: Error + 'static>(&self, err: &E) -> Result<RecordHandle, StoreError> {
        self.recorder.record_error(err)
    }

    /// Hands out the startup drain task. Returns `None` after the first call.
    pub fn take_drain(&mut self) -> Option<DrainTask> {
        self.drain.take()
    }
}
