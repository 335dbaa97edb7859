//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for the values stamped into
//! every diagnostic record. Each newtype ensures data validity at
//! construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// ApiKey
// ============================================================================

/// Opaque tenant identifier sent with every record and heartbeat
///
/// Must be non-empty and must not contain line breaks, since it is written
/// as a single `apiKey:` header line.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKey(String);

impl ApiKey {
    /// Create a new ApiKey with validation
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidApiKey("API key is empty".to_string()));
        }

        if trimmed.contains(['\n', '\r']) {
            return Err(DomainError::InvalidApiKey(
                "API key must be a single line".to_string(),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keys end up in logs via Debug; keep the tenant id out of them.
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let visible: String = self.0.chars().take(4).collect();
        write!(f, "ApiKey({visible}…)")
    }
}

impl Display for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ApiKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiKey> for String {
    fn from(key: ApiKey) -> Self {
        key.0
    }
}

// ============================================================================
// AppVersion
// ============================================================================

/// Release identity of the monitored application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppVersion {
    name: String,
    code: i64,
}

impl AppVersion {
    /// Create a new AppVersion from a human-readable name and a numeric code
    pub fn new(name: impl Into<String>, code: i64) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidVersionName(
                "version name is empty".to_string(),
            ));
        }
        Ok(Self {
            name: name.trim().to_string(),
            code,
        })
    }

    /// Human-readable version name, e.g. `1.4.2`
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Monotonic release code
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }
}

impl Display for AppVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

// ============================================================================
// DisplayGeometry
// ============================================================================

/// Pixel dimensions of the primary display, `0x0` when unknown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub width_px: u32,
    pub height_px: u32,
}

impl DisplayGeometry {
    #[must_use]
    pub const fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }
}

impl Display for DisplayGeometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width_px, self.height_px)
    }
}
