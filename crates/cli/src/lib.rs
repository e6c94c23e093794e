//! CLI tool for inspecting rosters.
//!
//! Provides commands for:
//! - Listing the nodes of a group file with their client URLs
//! - Printing the leader's client URL
//! - Validating node addresses

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
