//! crashbox HTTP - collector transport
//!
//! Provides the reqwest-based [`ITransport`](crashbox_core::ports::ITransport)
//! adapter that delivers records and heartbeats to the collector.
//!
//! ## Modules
//!
//! - [`client`] - `CollectorClient`, one POST per request, bounded by a timeout

pub mod client;

pub use client::CollectorClient;

use thiserror::Error;

/// Errors that can occur while setting up the collector client
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The endpoint is not an http(s) URL
    #[error("Invalid collector endpoint: {0}")]
    InvalidEndpoint(String),

    /// The underlying HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
