//! Command-line configuration.

use std::time::Duration;

use clap::Parser;
use connection::{ConnectionConfig, SecurityContext};
use corelib::endpoint::{ClientUrlMapping, DEFAULT_PORT_OFFSET};
use tracing::debug;

use crate::commands::Command;

/// Inspect roster group files and node addresses.
#[derive(Parser, Debug)]
#[command(name = "rosterctl")]
#[command(version)]
pub struct CliConfig {
    /// Added to a node's server port to get its client port
    #[arg(long, default_value_t = DEFAULT_PORT_OFFSET, allow_hyphen_values = true, global = true)]
    pub port_offset: i32,

    /// Upgrade client URLs to wss
    #[arg(long, global = true)]
    pub secure: bool,

    /// Reply timeout in milliseconds
    #[arg(long, default_value_t = 30_000, global = true)]
    pub timeout_ms: u64,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Connection settings described by the flags.
    pub fn connection_config(&self) -> ConnectionConfig {
        let security = if self.secure {
            SecurityContext::Secure
        } else {
            SecurityContext::Insecure
        };
        ConnectionConfig::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .security(security)
            .client_urls(ClientUrlMapping::with_port_offset(self.port_offset))
            .build()
    }

    /// Runs the selected command and prints its result.
    pub fn run(self) -> anyhow::Result<()> {
        let config = self.connection_config();
        debug!(?config, command = ?self.command, "running command");
        let result = self.command.execute(&config)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print!("{result}");
        }
        Ok(())
    }
}
