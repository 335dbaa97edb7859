//! Domain entities and business logic
//!
//! This module contains the core domain types for crashbox:
//! - Newtypes for validated values (`ApiKey`, `AppVersion`, `DisplayGeometry`)
//! - The immutable per-process `SessionContext`
//! - `DiagnosticRecord` and its text wire format
//! - `Fault` and `ThreadInfo`, the description of an unhandled fault
//! - Domain-specific error types

pub mod errors;
pub mod fault;
pub mod newtypes;
pub mod record;
pub mod session;

// Re-export commonly used types
pub use errors::{DomainError, RecordError};
pub use fault::{Fault, ThreadInfo};
pub use newtypes::*;
pub use record::{DiagnosticRecord, RECORD_EXTENSION};
pub use session::{now_millis, SessionContext, MONITOR_BUILD};
