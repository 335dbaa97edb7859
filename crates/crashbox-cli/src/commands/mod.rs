//! CLI subcommands and the wiring they share

pub mod completions;
pub mod config;
pub mod ping;
pub mod report;
pub mod trigger;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use crashbox_core::config::Config;
use crashbox_core::domain::{ApiKey, SessionContext};
use crashbox_core::ports::IHostEnvironment;
use crashbox_http::CollectorClient;
use crashbox_telemetry::{ConfiguredHost, RecordStore, Uploader};

/// Loads the config file; a missing file means defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    Config::load(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

pub fn api_key(config: &Config) -> Result<ApiKey> {
    let raw = config
        .auth
        .api_key
        .as_deref()
        .context("auth.api_key is not set; run 'crashbox config set auth.api_key <key>'")?;
    ApiKey::new(raw).context("Invalid auth.api_key")
}

/// Session context for commands that talk to the collector outside of a
/// monitored process.
pub fn session(config: &Config) -> Result<Arc<SessionContext>> {
    let host = ConfiguredHost::from_config(config);
    let version = host
        .app_version()
        .context("Invalid app version in configuration")?;

    Ok(Arc::new(
        SessionContext::new(api_key(config)?, version, host.display_geometry())
            .with_device_identifier(host.device_identifier()),
    ))
}

pub fn collector(config: &Config) -> Result<CollectorClient> {
    CollectorClient::from_config(&config.collector).context("Failed to set up collector client")
}

pub fn uploader(config: &Config) -> Result<Uploader> {
    Ok(Uploader::new(
        session(config)?,
        RecordStore::new(&config.storage.dir),
        Arc::new(collector(config)?),
    ))
}

#[cfg(test)]
mod tests {
    use crashbox_core::config::ConfigBuilder;

    use super::*;

    #[test]
    fn test_missing_config_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.collector.timeout_secs, 15);
    }

    #[test]
    fn test_unparseable_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "collector: [1, 2]\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_session_requires_api_key() {
        let err = session(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("auth.api_key is not set"));
    }

    #[test]
    fn test_session_from_config() {
        let config = ConfigBuilder::new()
            .api_key("tenant-42")
            .app_version("2.0.0", 20)
            .app_display(640, 480)
            .app_device_identifier("device-3")
            .build();

        let ctx = session(&config).unwrap();
        assert_eq!(ctx.api_key().as_str(), "tenant-42");
        assert_eq!(ctx.app_version().code(), 20);
        assert_eq!(ctx.display().to_string(), "640x480");
        assert_eq!(ctx.device_identifier(), Some("device-3"));
    }

    #[test]
    fn test_uploader_uses_configured_storage() {
        let config = ConfigBuilder::new()
            .api_key("tenant-42")
            .storage_dir("/tmp/crashbox-cli-test".into())
            .build();
        let uploader = uploader(&config).unwrap();
        assert_eq!(
            uploader.store().dir(),
            Path::new("/tmp/crashbox-cli-test")
        );
    }
}
