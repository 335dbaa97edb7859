//! Config command - View and manage crashbox configuration
//!
//! Provides the `crashbox config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use crashbox_core::config::Config;
use tracing::info;

use crate::commands::load_config;
use crate::output::{get_formatter, OutputFormat};

/// Keys accepted by `config set`, with a short description each.
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("auth.api_key", "Tenant API key ('none' to clear)"),
    ("collector.endpoint", "Collector submission URL"),
    ("collector.timeout_secs", "Request timeout in seconds"),
    ("storage.dir", "Directory for pending crash records"),
    ("app.version_name", "Monitored application version name"),
    ("app.version_code", "Monitored application version code"),
    ("app.display_width", "Display width in pixels"),
    ("app.display_height", "Display height in pixels"),
    ("app.device_identifier", "Opaque device identifier ('none' to clear)"),
    ("logging.level", "trace|debug|info|warn|error"),
];

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "collector.timeout_secs")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(format, config_path),
            ConfigCommand::Set { key, value } => self.execute_set(key, value, format, config_path),
            ConfigCommand::Validate => self.execute_validate(format, config_path),
        }
    }

    fn execute_show(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);
        let mut config = load_config(config_path)?;

        info!(config_path = %config_path.display(), "Showing configuration");

        // Never echo the full key
        if let Some(key) = config.auth.api_key.as_mut() {
            *key = mask_secret(key);
        }

        if format.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;

            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    fn execute_set(
        &self,
        key: &str,
        value: &str,
        format: OutputFormat,
        config_path: &Path,
    ) -> Result<()> {
        let formatter = get_formatter(format);
        let mut config = load_config(config_path)?;

        info!(key = %key, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for (name, description) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {:<24} - {}", name, description));
                }
            }
            return Ok(());
        }

        // Validate the new config before saving
        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "errors": messages,
                }));
            } else {
                formatter.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    messages.join("; ")
                ));
            }
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(config_path, &yaml).context("Failed to write configuration file")?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {}", key));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }

        Ok(())
    }

    fn execute_validate(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let message = if config_path.exists() {
                    format!("Failed to parse configuration: {}", e)
                } else {
                    "Configuration file not found. Using defaults.".to_string()
                };

                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [message],
                    }));
                } else if config_path.exists() {
                    formatter.error(&message);
                    formatter.info(&format!("File: {}", config_path.display()));
                } else {
                    formatter.info(&format!(
                        "Configuration file not found at {}",
                        config_path.display()
                    ));
                    formatter.info("Using default configuration. Run 'crashbox config set <key> <value>' to create one.");
                }
                return Ok(());
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let mut errors = config.validate();
        if config.auth.api_key.is_none() {
            errors.push(crashbox_core::config::ValidationError {
                field: "auth.api_key".into(),
                message: "not set; records cannot be uploaded".into(),
            });
        }

        if format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }
}

/// Apply a dot-notation key/value pair to a Config struct
///
/// See [`SUPPORTED_KEYS`] for the accepted keys.
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- auth ---
        "auth.api_key" => {
            config.auth.api_key = optional(value);
        }

        // --- collector ---
        "collector.endpoint" => {
            config.collector.endpoint = value.to_string();
        }
        "collector.timeout_secs" => {
            config.collector.timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for collector.timeout_secs")?;
        }

        // --- storage ---
        "storage.dir" => {
            config.storage.dir = PathBuf::from(value);
        }

        // --- app ---
        "app.version_name" => {
            config.app.version_name = value.to_string();
        }
        "app.version_code" => {
            config.app.version_code = value
                .parse::<i64>()
                .context("Expected an integer for app.version_code")?;
        }
        "app.display_width" => {
            config.app.display_width = value
                .parse::<u32>()
                .context("Expected a positive integer")?;
        }
        "app.display_height" => {
            config.app.display_height = value
                .parse::<u32>()
                .context("Expected a positive integer")?;
        }
        "app.device_identifier" => {
            config.app.device_identifier = optional(value);
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_string();
        }

        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}

/// `""` and `"none"` clear an optional value.
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Keeps the first four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_api_key() {
        let mut config = Config::default();
        apply_config_value(&mut config, "auth.api_key", "tenant-42").unwrap();
        assert_eq!(config.auth.api_key.as_deref(), Some("tenant-42"));
    }

    #[test]
    fn test_apply_api_key_none() {
        let mut config = Config::default();
        config.auth.api_key = Some("existing".to_string());
        apply_config_value(&mut config, "auth.api_key", "none").unwrap();
        assert_eq!(config.auth.api_key, None);
    }

    #[test]
    fn test_apply_collector_values() {
        let mut config = Config::default();
        apply_config_value(&mut config, "collector.endpoint", "http://localhost:8080/submit")
            .unwrap();
        apply_config_value(&mut config, "collector.timeout_secs", "30").unwrap();
        assert_eq!(config.collector.endpoint, "http://localhost:8080/submit");
        assert_eq!(config.collector.timeout_secs, 30);
    }

    #[test]
    fn test_apply_storage_dir() {
        let mut config = Config::default();
        apply_config_value(&mut config, "storage.dir", "/var/lib/app/traces").unwrap();
        assert_eq!(config.storage.dir, PathBuf::from("/var/lib/app/traces"));
    }

    #[test]
    fn test_apply_app_values() {
        let mut config = Config::default();
        apply_config_value(&mut config, "app.version_name", "2.1.0").unwrap();
        apply_config_value(&mut config, "app.version_code", "210").unwrap();
        apply_config_value(&mut config, "app.display_width", "1920").unwrap();
        apply_config_value(&mut config, "app.display_height", "1080").unwrap();
        apply_config_value(&mut config, "app.device_identifier", "device-1").unwrap();

        assert_eq!(config.app.version_name, "2.1.0");
        assert_eq!(config.app.version_code, 210);
        assert_eq!(config.app.display_width, 1920);
        assert_eq!(config.app.display_height, 1080);
        assert_eq!(config.app.device_identifier.as_deref(), Some("device-1"));
    }

    #[test]
    fn test_apply_logging_level() {
        let mut config = Config::default();
        apply_config_value(&mut config, "logging.level", "debug").unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_apply_unknown_key_fails() {
        let mut config = Config::default();
        assert!(apply_config_value(&mut config, "unknown.key", "value").is_err());
    }

    #[test]
    fn test_apply_invalid_numbers_fail() {
        let mut config = Config::default();
        assert!(apply_config_value(&mut config, "collector.timeout_secs", "soon").is_err());
        assert!(apply_config_value(&mut config, "collector.timeout_secs", "-5").is_err());
        assert!(apply_config_value(&mut config, "app.display_width", "wide").is_err());
        assert!(apply_config_value(&mut config, "app.version_code", "1.2").is_err());
    }

    #[test]
    fn test_every_supported_key_is_accepted() {
        for (key, _) in SUPPORTED_KEYS {
            let mut config = Config::default();
            let value = match *key {
                "collector.timeout_secs"
                | "app.version_code"
                | "app.display_width"
                | "app.display_height" => "1",
                _ => "x",
            };
            assert!(
                apply_config_value(&mut config, key, value).is_ok(),
                "key {key} rejected"
            );
        }
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("tenant-42"), "tena***");
        assert_eq!(mask_secret("ab"), "ab***");
    }

    #[tokio::test]
    async fn test_set_writes_valid_config_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crashbox").join("config.yaml");

        ConfigCommand::Set {
            key: "collector.timeout_secs".into(),
            value: "0".into(),
        }
        .execute(OutputFormat::Json, &path)
        .await
        .unwrap();
        assert!(!path.exists());

        ConfigCommand::Set {
            key: "auth.api_key".into(),
            value: "tenant-42".into(),
        }
        .execute(OutputFormat::Json, &path)
        .await
        .unwrap();

        let saved = Config::load(&path).unwrap();
        assert_eq!(saved.auth.api_key.as_deref(), Some("tenant-42"));
    }

    #[tokio::test]
    async fn test_set_keeps_existing_keys_of_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "auth:\n  api_key: tenant-42\ncollector:\n  endpoint: http://my.collector/submit\n",
        )
        .unwrap();

        ConfigCommand::Set {
            key: "logging.level".into(),
            value: "debug".into(),
        }
        .execute(OutputFormat::Json, &path)
        .await
        .unwrap();

        let saved = Config::load(&path).unwrap();
        assert_eq!(saved.auth.api_key.as_deref(), Some("tenant-42"));
        assert_eq!(saved.collector.endpoint, "http://my.collector/submit");
        assert_eq!(saved.logging.level, "debug");
    }

    #[tokio::test]
    async fn test_set_refuses_to_overwrite_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let original = "collector: [1, 2]\n";
        std::fs::write(&path, original).unwrap();

        let result = ConfigCommand::Set {
            key: "logging.level".into(),
            value: "debug".into(),
        }
        .execute(OutputFormat::Json, &path)
        .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }
}
