//! Trigger command - crash on purpose to check the pipeline end to end
//!
//! Initializes the monitor exactly as a host application would, waits for
//! the startup drain, then panics on a worker thread. The record it leaves
//! behind is delivered by the next `crashbox report send` or the next
//! monitored start.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use crashbox_telemetry::{ConfiguredHost, DrainOutcome, Monitor};
use tracing::info;

use crate::commands::{api_key, collector, load_config};
use crate::output::{get_formatter, OutputFormat};

/// Arguments for the trigger subcommand
#[derive(Debug, clap::Args)]
pub struct TriggerCommand {
    /// Panic message of the deliberate crash
    #[arg(long, default_value = "crashbox test crash")]
    pub message: String,
}

impl TriggerCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);
        let config = load_config(config_path)?;
        let host = ConfiguredHost::from_config(&config);
        let key = api_key(&config)?;

        let mut monitor = Monitor::initialize(
            &host,
            key.as_str(),
            host.device_identifier(),
            Arc::new(collector(&config)?),
        )?;

        let startup = match monitor.take_drain() {
            Some(task) => task.outcome().await,
            None => None,
        };
        info!(?startup, "Startup drain finished");

        let message = self.message.clone();
        let crashed = std::thread::Builder::new()
            .name("crashbox-trigger".to_string())
            .spawn(move || panic!("{message}"))
            .context("Failed to start trigger thread")?
            .join()
            .is_err();

        let newest = monitor
            .recorder()
            .store()
            .list_pending()?
            .into_iter()
            .next_back();

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "crashed": crashed,
                "startup_drain": startup,
                "record": newest.as_ref().map(|h| h.path.display().to_string()),
            }));
            return Ok(());
        }

        if let Some(DrainOutcome::Drained {
            delivered,
            retained,
        }) = startup
        {
            formatter.info(&format!(
                "Startup drain: {} delivered, {} retained",
                delivered, retained
            ));
        }
        match newest {
            Some(handle) if crashed => {
                formatter.success(&format!("Crash recorded to {}", handle.path.display()))
            }
            _ => formatter.error("No crash record was written"),
        }
        Ok(())
    }
}
