//! Session context
//!
//! [`SessionContext`] holds everything that identifies the running
//! installation: tenant key, app release, display geometry and device id.
//! It is built once at startup, wrapped in an `Arc`, and read concurrently by
//! the crash recorder (to stamp new records) and the uploader (to stamp
//! heartbeats). It has no interior mutability, so readers never lock.

use chrono::Utc;

use super::newtypes::{ApiKey, AppVersion, DisplayGeometry};
use super::record::DiagnosticRecord;

/// Numeric build id of this capture library.
///
/// Sent as the `monitorVersion` header and compared against the latest
/// version the collector reports back.
pub const MONITOR_BUILD: u64 = 20261019;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Immutable per-process tracking values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    api_key: ApiKey,
    app_version: AppVersion,
    monitor_version: String,
    display: DisplayGeometry,
    device_identifier: Option<String>,
}

impl SessionContext {
    /// Creates a new context stamped with this library's [`MONITOR_BUILD`].
    pub fn new(api_key: ApiKey, app_version: AppVersion, display: DisplayGeometry) -> Self {
        Self {
            api_key,
            app_version,
            monitor_version: MONITOR_BUILD.to_string(),
            display,
            device_identifier: None,
        }
    }

    /// Sets the opaque device identifier. Blank values are treated as absent.
    pub fn with_device_identifier(mut self, device_identifier: Option<String>) -> Self {
        self.device_identifier = device_identifier
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn app_version(&self) -> &AppVersion {
        &self.app_version
    }

    pub fn monitor_version(&self) -> &str {
        &self.monitor_version
    }

    pub fn display(&self) -> DisplayGeometry {
        self.display
    }

    pub fn device_identifier(&self) -> Option<&str> {
        self.device_identifier.as_deref()
    }

    /// Builds the record for a fault captured at `timestamp_millis`.
    pub fn record(&self, timestamp_millis: i64, fault_summary: String) -> DiagnosticRecord {
        DiagnosticRecord {
            monitor_version: self.monitor_version.clone(),
            api_key: self.api_key.as_str().to_string(),
            app_version_name: self.app_version.name().to_string(),
            app_version_code: self.app_version.code(),
            display_width_px: self.display.width_px,
            display_height_px: self.display.height_px,
            timestamp_millis,
            device_identifier: self.device_identifier.clone(),
            fault_summary,
        }
    }

    /// Heartbeat payload: the record header block without any trace.
    pub fn heartbeat(&self, timestamp_millis: i64) -> String {
        self.record(timestamp_millis, String::new()).header_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SessionContext {
        SessionContext::new(
            ApiKey::new("tenant-42").unwrap(),
            AppVersion::new("1.4.2", 42).unwrap(),
            DisplayGeometry::new(1080, 1920),
        )
    }

    #[test]
    fn test_record_is_stamped_from_context() {
        let ctx = context().with_device_identifier(Some("device-7".to_string()));
        let record = ctx.record(1_000, "trace\n".to_string());

        assert_eq!(record.monitor_version, MONITOR_BUILD.to_string());
        assert_eq!(record.api_key, "tenant-42");
        assert_eq!(record.app_version_name, "1.4.2");
        assert_eq!(record.app_version_code, 42);
        assert_eq!(record.display_width_px, 1080);
        assert_eq!(record.display_height_px, 1920);
        assert_eq!(record.timestamp_millis, 1_000);
        assert_eq!(record.device_identifier.as_deref(), Some("device-7"));
        assert_eq!(record.fault_summary, "trace\n");
    }

    #[test]
    fn test_heartbeat_is_header_only() {
        let ctx = context();
        let ping = ctx.heartbeat(1_234);

        assert!(ping.starts_with(&format!("monitorVersion:{MONITOR_BUILD}\n")));
        assert!(ping.contains("apiKey:tenant-42\n"));
        assert!(ping.contains("versionCode:42\n"));
        assert!(ping.ends_with("time:1234\n"));
        assert!(!ping.contains("\n\n"));
    }

    #[test]
    fn test_blank_device_identifier_is_dropped() {
        let ctx = context().with_device_identifier(Some("   ".to_string()));
        assert!(ctx.device_identifier().is_none());
    }

    #[test]
    fn test_context_is_shareable_across_threads() {
        let ctx = std::sync::Arc::new(context());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ctx = std::sync::Arc::clone(&ctx);
                std::thread::spawn(move || ctx.record(i, String::new()).timestamp_millis)
            })
            .collect();

        let mut stamps: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        stamps.sort_unstable();
        assert_eq!(stamps, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }
}
