//! crashbox Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `SessionContext`, `DiagnosticRecord`, `Fault`, `ThreadInfo`
//! - **Port definitions** - Traits for adapters: `ITransport`, `IHostEnvironment`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module is pure: building and parsing the on-disk record format
//! never touches the filesystem or the network. Ports define the trait
//! interfaces that the telemetry and HTTP crates implement or consume.

pub mod config;
pub mod domain;
pub mod ports;
