//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ITransport`] - Delivery of records and heartbeats to the collector
//! - [`IHostEnvironment`] - App version, display geometry and storage path

pub mod host;
pub mod transport;

pub use host::IHostEnvironment;
pub use transport::{ITransport, SubmissionKind, TransportResponse, UploadRequest};
