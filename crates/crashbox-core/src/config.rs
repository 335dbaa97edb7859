//! Configuration module for crashbox.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::newtypes::ApiKey;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for crashbox.
///
/// Missing sections and missing keys fall back to their defaults, so a file
/// containing only `auth.api_key` is a complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub collector: CollectorConfig,
    pub storage: StorageConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
}

/// Tenant credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Opaque tenant API key. `None` until the user sets one.
    pub api_key: Option<String>,
}

/// Remote collector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Submission endpoint; the `mode` query parameter is appended per request.
    pub endpoint: String,
    /// Upper bound, in seconds, for a single request including the response body.
    pub timeout_secs: u64,
}

/// Local record storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding pending `.stacktrace` records.
    pub dir: PathBuf,
}

/// Identity of the monitored application, used when the host does not
/// supply it programmatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version_name: String,
    pub version_code: i64,
    pub display_width: u32,
    pub display_height: u32,
    pub device_identifier: Option<String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/crashbox/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("crashbox")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default submission endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://collector.crashbox.dev/submit";

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("crashbox")
                .join("traces"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version_name: "0.0.0".to_string(),
            version_code: 0,
            display_width: 0,
            display_height: 0,
            device_identifier: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"collector.timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Longest request timeout accepted, in seconds.
const MAX_TIMEOUT_SECS: u64 = 300;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- auth ---
        if let Some(ref key) = self.auth.api_key {
            if let Err(e) = ApiKey::new(key.as_str()) {
                errors.push(ValidationError {
                    field: "auth.api_key".into(),
                    message: e.to_string(),
                });
            }
        }

        // --- collector ---
        let endpoint = self.collector.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ValidationError {
                field: "collector.endpoint".into(),
                message: format!("must be an http(s) URL, got '{}'", self.collector.endpoint),
            });
        }
        if self.collector.timeout_secs == 0 || self.collector.timeout_secs > MAX_TIMEOUT_SECS {
            errors.push(ValidationError {
                field: "collector.timeout_secs".into(),
                message: format!("must be in range 1..={MAX_TIMEOUT_SECS}"),
            });
        }

        // --- storage ---
        if self.storage.dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.dir".into(),
                message: "must not be empty".into(),
            });
        }

        // --- app ---
        if self.app.version_name.trim().is_empty() {
            errors.push(ValidationError {
                field: "app.version_name".into(),
                message: "must not be empty".into(),
            });
        }
        if self.app.version_code < 0 {
            errors.push(ValidationError {
                field: "app.version_code".into(),
                message: "must not be negative".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use crashbox_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .api_key("tenant-42")
///     .storage_dir(PathBuf::from("/var/lib/myapp/traces"))
///     .app_version("1.4.2", 42)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- auth ---

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.auth.api_key = Some(key.into());
        self
    }

    // --- collector ---

    pub fn collector_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.collector.endpoint = endpoint.into();
        self
    }

    pub fn collector_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.collector.timeout_secs = seconds;
        self
    }

    // --- storage ---

    pub fn storage_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.dir = dir;
        self
    }

    // --- app ---

    pub fn app_version(mut self, name: impl Into<String>, code: i64) -> Self {
        self.config.app.version_name = name.into();
        self.config.app.version_code = code;
        self
    }

    pub fn app_display(mut self, width: u32, height: u32) -> Self {
        self.config.app.display_width = width;
        self.config.app.display_height = height;
        self
    }

    pub fn app_device_identifier(mut self, id: impl Into<String>) -> Self {
        self.config.app.device_identifier = Some(id.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
