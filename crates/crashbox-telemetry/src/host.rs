//! Config-backed host environment
//!
//! Hosts that do not implement [`IHostEnvironment`] themselves can describe
//! their identity in the `app` and `storage` config sections.

use std::path::PathBuf;

use crashbox_core::config::{AppConfig, Config};
use crashbox_core::domain::{AppVersion, DisplayGeometry};
use crashbox_core::ports::IHostEnvironment;

#[derive(Debug, Clone)]
pub struct ConfiguredHost {
    app: AppConfig,
    storage_dir: PathBuf,
}

impl ConfiguredHost {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app: config.app.clone(),
            storage_dir: config.storage.dir.clone(),
        }
    }

    pub fn device_identifier(&self) -> Option<String> {
        self.app.device_identifier.clone()
    }
}

impl IHostEnvironment for ConfiguredHost {
    fn app_version(&self) -> anyhow::Result<AppVersion> {
        Ok(AppVersion::new(
            self.app.version_name.clone(),
            self.app.version_code,
        )?)
    }

    fn display_geometry(&self) -> DisplayGeometry {
        DisplayGeometry::new(self.app.display_width, self.app.display_height)
    }

    fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use crashbox_core::config::ConfigBuilder;

    use super::*;

    #[test]
    fn test_values_come_from_config() {
        let config = ConfigBuilder::new()
            .app_version("3.1.0", 310)
            .app_display(1440, 900)
            .app_device_identifier("device-9")
            .storage_dir(PathBuf::from("/tmp/crashbox-host"))
            .build();
        let host = ConfiguredHost::from_config(&config);

        let version = host.app_version().unwrap();
        assert_eq!(version.name(), "3.1.0");
        assert_eq!(version.code(), 310);
        assert_eq!(host.display_geometry(), DisplayGeometry::new(1440, 900));
        assert_eq!(host.storage_dir(), PathBuf::from("/tmp/crashbox-host"));
        assert_eq!(host.device_identifier().as_deref(), Some("device-9"));
    }

    #[test]
    fn test_blank_version_is_an_error() {
        let config = ConfigBuilder::new().app_version("  ", 1).build();
        let host = ConfiguredHost::from_config(&config);
        assert!(host.app_version().is_err());
    }
}
