//! Command-line configuration and logging setup.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use corelib::PlacementConfig;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

/// Offline driver for load-aware segment placement.
#[derive(Debug, Parser)]
#[command(name = "placement-cli", version)]
pub struct CliConfig {
    /// JSON placement configuration; flags given on the command line win.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides `max_acceptable_error_rate` from the configuration file.
    #[arg(long, global = true)]
    pub max_error_rate: Option<f64>,

    /// Overrides `ledger_half_life_secs` from the configuration file.
    #[arg(long, global = true)]
    pub ledger_half_life_secs: Option<u64>,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Pretty-print command output.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> anyhow::Result<()> {
        init_logging(self.log_json)?;

        let placement = self.placement_config()?;
        let result = self.command.execute(&placement)?;

        let out = if self.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        println!("{}", out);
        Ok(())
    }

    /// Load the configuration file, or defaults when none was given, then
    /// apply command-line overrides.
    pub fn placement_config(&self) -> anyhow::Result<PlacementConfig> {
        let mut config = match &self.config {
            Some(path) => PlacementConfig::from_json_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => PlacementConfig::default(),
        };
        if let Some(rate) = self.max_error_rate {
            config.max_acceptable_error_rate = rate;
        }
        if let Some(secs) = self.ledger_half_life_secs {
            config.ledger_half_life_secs = Some(secs);
        }
        config.validate().context("invalid placement configuration")?;
        Ok(config)
    }
}

fn init_logging(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("installing log subscriber: {}", e))
}
