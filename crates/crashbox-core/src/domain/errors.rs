//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! validation of session values and parsing of stored diagnostic records.

use thiserror::Error;

/// Errors that can occur while building domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// API key was empty or contained a line break
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    /// Application version name was empty
    #[error("Invalid version name: {0}")]
    InvalidVersionName(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors produced when parsing a stored `.stacktrace` record
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A required header key was absent
    #[error("Missing header field: {0}")]
    MissingField(&'static str),

    /// A numeric header held something that is not a number
    #[error("Invalid value for {field}: {value}")]
    InvalidField {
        /// Wire key of the offending header
        field: &'static str,
        /// Raw value found in the record
        value: String,
    },

    /// The blank line between header and trace was not found
    #[error("Record has no blank line between header and trace")]
    MissingSeparator,
}
