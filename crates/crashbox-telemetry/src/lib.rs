//! crashbox telemetry - crash capture and delivery
//!
//! Provides:
//! - `CrashRecorder`: panic hook that persists a record, then chains
//! - `RecordStore`: directory of pending `.stacktrace` records
//! - `Uploader`: drains the store through an `ITransport`, or sends a heartbeat
//! - `VersionAdvisor`: one-time "newer build available" notice
//! - `Monitor`: the `initialize` entry point and its `DrainTask`
//! - `ConfiguredHost`: `IHostEnvironment` backed by the config file

pub mod advisory;
pub mod host;
pub mod monitor;
pub mod recorder;
pub mod store;
pub mod uploader;

pub use advisory::VersionAdvisor;
pub use host::ConfiguredHost;
pub use monitor::{DrainTask, Monitor, MonitorError};
pub use recorder::{install, CrashRecorder, FaultHandler, PanicHook, PanicHookChain};
pub use store::{RecordHandle, RecordStore, StoreError};
pub use uploader::{DrainOutcome, Uploader};
