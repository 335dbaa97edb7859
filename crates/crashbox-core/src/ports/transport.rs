//! Transport port (driven/secondary port)
//!
//! This module defines the interface for delivering records and heartbeats
//! to the remote collector. The primary implementation is the reqwest-based
//! `CollectorClient` in `crashbox-http`; tests substitute in-memory stubs.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport failures (DNS, TLS, timeouts)
//!   are adapter-specific. The uploader treats every `Err` like a non-200.
//! - Only the status code carries meaning: 200 acknowledges, anything else
//!   does not. The body is passed through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// SubmissionKind
// ============================================================================

/// Discriminates the two request kinds the collector accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    /// A stored `.stacktrace` record
    StackTrace,
    /// A liveness ping sent when nothing is pending
    Heartbeat,
}

impl SubmissionKind {
    /// Value of the `mode` query parameter for this kind
    pub const fn mode(&self) -> &'static str {
        match self {
            SubmissionKind::StackTrace => "stacktrace",
            SubmissionKind::Heartbeat => "ping",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mode())
    }
}

// ============================================================================
// UploadRequest / TransportResponse
// ============================================================================

/// One request to the collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub kind: SubmissionKind,
    /// Raw request body (record bytes or heartbeat text)
    pub body: Vec<u8>,
}

impl UploadRequest {
    pub fn stack_trace(body: Vec<u8>) -> Self {
        Self {
            kind: SubmissionKind::StackTrace,
            body,
        }
    }

    pub fn heartbeat(body: impl Into<String>) -> Self {
        Self {
            kind: SubmissionKind::Heartbeat,
            body: body.into().into_bytes(),
        }
    }
}

/// What came back from the collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body decoded lossily as UTF-8, possibly empty
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the collector positively acknowledged the request
    pub fn is_acknowledged(&self) -> bool {
        self.status == 200
    }
}

// ============================================================================
// ITransport trait
// ============================================================================

/// Port for sending requests to the collector
///
/// ## Contract
///
/// - One call sends exactly one request.
/// - Implementations must bound each call with a timeout; a timed-out
///   request is reported as `Err`.
/// - Implementations must not retry internally: the uploader decides what
///   happens to an unacknowledged record.
#[async_trait::async_trait]
pub trait ITransport: Send + Sync {
    /// Sends a request and returns the collector's status and body.
    async fn send(&self, request: UploadRequest) -> anyhow::Result<TransportResponse>;
}
