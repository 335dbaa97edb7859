//! Ping command - send one heartbeat to the collector

use std::path::Path;

use anyhow::Result;
use crashbox_telemetry::DrainOutcome;

use crate::commands::{load_config, uploader};
use crate::output::{get_formatter, OutputFormat};

/// Arguments for the ping subcommand
#[derive(Debug, clap::Args)]
pub struct PingCommand {}

impl PingCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);
        let config = load_config(config_path)?;
        let uploader = uploader(&config)?;

        let outcome = uploader.send_heartbeat().await;
        let acknowledged = matches!(outcome, DrainOutcome::Heartbeat { acknowledged: true });

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "endpoint": config.collector.endpoint,
                "acknowledged": acknowledged,
                "newer_build_available": uploader.advisor().has_advised(),
            }));
        } else if acknowledged {
            formatter.success(&format!("Collector at {} is reachable", config.collector.endpoint));
        } else {
            formatter.error(&format!(
                "Collector at {} did not acknowledge the heartbeat",
                config.collector.endpoint
            ));
        }

        if uploader.advisor().has_advised() && !format.is_json() {
            formatter.warn("A newer crash monitor build is available");
        }
        Ok(())
    }
}
