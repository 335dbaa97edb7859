//! Report command - Manage stored crash records
//!
//! Provides the `crashbox report` CLI command with subcommands:
//! - `list`: Show all pending records
//! - `view <id>`: Display one record
//! - `send`: Upload pending records to the collector now
//! - `delete`: Remove records from local storage

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use crashbox_core::config::Config;
use crashbox_core::domain::DiagnosticRecord;
use crashbox_telemetry::{DrainOutcome, RecordHandle, RecordStore};
use tracing::info;

use crate::commands::{load_config, uploader};
use crate::output::{format_size, format_timestamp, get_formatter, OutputFormat, OutputFormatter};

/// Record management subcommands
#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// List pending crash records
    List,
    /// View a specific record
    View {
        /// Record ID (capture timestamp) or file name
        id: String,
    },
    /// Upload pending records to the collector
    Send {
        /// Specific record ID (omit for all pending)
        id: Option<String>,
    },
    /// Delete records from local storage
    Delete {
        /// Specific record ID to delete
        id: Option<String>,
        /// Delete all records
        #[arg(long)]
        all: bool,
    },
}

impl ReportCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);
        let config = load_config(config_path)?;
        let store = RecordStore::new(&config.storage.dir);

        match self {
            ReportCommand::List => list(&store, format, formatter.as_ref()),
            ReportCommand::View { id } => view(&store, id, format.is_json(), formatter.as_ref()),
            ReportCommand::Send { id } => {
                send(&config, &store, id.as_deref(), format, formatter.as_ref()).await
            }
            ReportCommand::Delete { id, all } => {
                delete(&store, id.as_deref(), *all, formatter.as_ref())
            }
        }
    }
}

fn list(store: &RecordStore, format: OutputFormat, formatter: &dyn OutputFormatter) -> Result<()> {
    let handles = store.list_pending()?;

    if format.is_json() {
        formatter.print_json(&serde_json::to_value(&handles)?);
        return Ok(());
    }

    if handles.is_empty() {
        formatter.info("No pending crash records.");
        return Ok(());
    }

    println!("{:<16} {:<20} {:>10}", "ID", "Captured (UTC)", "Size");
    println!("{}", "-".repeat(48));
    for handle in &handles {
        println!(
            "{:<16} {:<20} {:>10}",
            handle.id(),
            format_timestamp(handle.timestamp_millis),
            format_size(handle.size_bytes),
        );
    }
    println!();
    println!("Total: {} record(s) in {}", handles.len(), store.dir().display());
    Ok(())
}

fn view(store: &RecordStore, id: &str, json: bool, formatter: &dyn OutputFormatter) -> Result<()> {
    let Some(handle) = store.find(id)? else {
        formatter.error(&format!("Record '{}' not found", id));
        return Ok(());
    };

    let bytes = store.read(&handle)?;
    let text = String::from_utf8_lossy(&bytes);

    match DiagnosticRecord::parse(&text) {
        Ok(record) if json => {
            let value = serde_json::to_value(&record).context("Failed to serialize record")?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Ok(record) => print_record(&handle, &record),
        Err(e) => {
            formatter.warn(&format!("Record '{}' is not well-formed: {}", id, e));
            print!("{}", text);
        }
    }
    Ok(())
}

fn print_record(handle: &RecordHandle, record: &DiagnosticRecord) {
    println!("Record:       {}", handle.path.display());
    println!("Captured:     {}", format_timestamp(Some(record.timestamp_millis)));
    println!(
        "App version:  {} ({})",
        record.app_version_name, record.app_version_code
    );
    println!("Monitor:      {}", record.monitor_version);
    println!(
        "Display:      {}x{}",
        record.display_width_px, record.display_height_px
    );
    if let Some(ref device) = record.device_identifier {
        println!("Device:       {}", device);
    }
    println!();
    print!("{}", record.fault_summary);
}

async fn send(
    config: &Config,
    store: &RecordStore,
    id: Option<&str>,
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let uploader = uploader(config)?;

    let Some(id) = id else {
        if store.list_pending()?.is_empty() {
            formatter.info("No pending crash records to send.");
            return Ok(());
        }

        info!(endpoint = %config.collector.endpoint, "Sending pending crash records");
        let outcome = uploader.run().await;
        if format.is_json() {
            formatter.print_json(&serde_json::to_value(outcome)?);
            return Ok(());
        }
        match outcome {
            DrainOutcome::Drained {
                delivered,
                retained,
            } => {
                formatter.success(&format!("Delivered {} record(s)", delivered));
                if retained > 0 {
                    formatter.warn(&format!(
                        "{} record(s) were not acknowledged and stay queued",
                        retained
                    ));
                }
            }
            DrainOutcome::Heartbeat { .. } => {
                formatter.info("No pending crash records to send.");
            }
            DrainOutcome::Aborted => {
                formatter.error(&format!(
                    "Cannot read record directory {}",
                    store.dir().display()
                ));
            }
        }
        return Ok(());
    };

    let Some(handle) = store.find(id)? else {
        formatter.error(&format!("Record '{}' not found", id));
        return Ok(());
    };

    let delivered = uploader.deliver(&handle).await;
    if format.is_json() {
        formatter.print_json(&serde_json::json!({
            "id": handle.id(),
            "delivered": delivered,
        }));
    } else if delivered {
        formatter.success(&format!("Delivered record '{}'", handle.id()));
    } else {
        formatter.error(&format!(
            "Collector did not acknowledge record '{}'; it stays queued",
            handle.id()
        ));
    }
    Ok(())
}

fn delete(
    store: &RecordStore,
    id: Option<&str>,
    all: bool,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    if all {
        let count = store.delete_all()?;
        formatter.success(&format!("Deleted {} record(s)", count));
    } else if let Some(id) = id {
        match store.find(id)? {
            Some(handle) => {
                store.delete(&handle)?;
                formatter.success(&format!("Deleted record '{}'", handle.id()));
            }
            None => formatter.error(&format!("Record '{}' not found", id)),
        }
    } else {
        formatter.error("Specify a record ID or use --all");
    }
    Ok(())
}
