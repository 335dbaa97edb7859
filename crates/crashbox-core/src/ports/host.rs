//! Host environment port (driven/secondary port)
//!
//! The monitored application knows things the monitor cannot discover on its
//! own: its release identity, the display it renders to, and where it is
//! allowed to write. This port is how those values reach `Monitor::initialize`.

use std::path::PathBuf;

use crate::domain::newtypes::{AppVersion, DisplayGeometry};

/// Port for host-supplied metadata
///
/// Values are read once, during initialization, before the crash recorder is
/// installed.
pub trait IHostEnvironment: Send + Sync {
    /// Release identity of the monitored application.
    ///
    /// An error here aborts initialization: records without a version are
    /// useless to the collector.
    fn app_version(&self) -> anyhow::Result<AppVersion>;

    /// Primary display geometry; `0x0` when unknown.
    fn display_geometry(&self) -> DisplayGeometry;

    /// Writable directory for pending records.
    fn storage_dir(&self) -> PathBuf;
}
