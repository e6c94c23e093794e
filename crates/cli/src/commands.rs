//! rosterctl subcommands.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use connection::ConnectionConfig;
use corelib::{GroupDescription, NodeAddress, NodeDescriptor};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the nodes of a group file with their client URLs
    Inspect {
        /// Group description (JSON)
        path: PathBuf,
    },

    /// Print the client URL of the roster leader
    Leader {
        /// Group description (JSON)
        path: PathBuf,
    },

    /// Validate a node address and print its parts
    CheckAddress { address: String },
}

/// One node as listed by `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRow {
    pub id: String,
    pub address: String,
    pub client_url: String,
    pub description: Option<String>,
    pub leader: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandResult {
    Roster {
        description: Option<String>,
        timeout_ms: u128,
        nodes: Vec<NodeRow>,
    },
    Leader {
        address: String,
        url: String,
    },
    Address {
        conn_type: String,
        host: String,
        port: u16,
        network_address: String,
    },
}

impl Command {
    pub fn execute(&self, config: &ConnectionConfig) -> anyhow::Result<CommandResult> {
        match self {
            Command::Inspect { path } => inspect(&load_group(path)?, config),
            Command::Leader { path } => leader(&load_group(path)?, config),
            Command::CheckAddress { address } => check_address(address),
        }
    }
}

pub fn load_group(path: &Path) -> anyhow::Result<GroupDescription> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    GroupDescription::from_json(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn inspect(group: &GroupDescription, config: &ConnectionConfig) -> anyhow::Result<CommandResult> {
    let nodes = group
        .roster
        .iter()
        .enumerate()
        .map(|(i, node)| {
            Ok(NodeRow {
                id: node.id().to_string(),
                address: node.address.to_string(),
                client_url: client_url(node, config)?,
                description: node.description.clone(),
                leader: i == 0,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CommandResult::Roster {
        description: group.description.clone(),
        timeout_ms: config.timeout.as_millis(),
        nodes,
    })
}

pub fn leader(group: &GroupDescription, config: &ConnectionConfig) -> anyhow::Result<CommandResult> {
    let node = group.roster.leader().context("roster is empty")?;
    Ok(CommandResult::Leader {
        address: node.address.to_string(),
        url: client_url(node, config)?,
    })
}

pub fn check_address(address: &str) -> anyhow::Result<CommandResult> {
    let parsed: NodeAddress = address.parse()?;
    Ok(CommandResult::Address {
        conn_type: parsed.conn_type().to_string(),
        host: parsed.host().to_string(),
        port: parsed.port(),
        network_address: parsed.network_address(),
    })
}

/// Client URL as a connection built with `config` would use it.
fn client_url(node: &NodeDescriptor, config: &ConnectionConfig) -> anyhow::Result<String> {
    let url = config.client_urls.client_url(node)?;
    Ok(config.effective_url(&url)?)
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Roster {
                description,
                timeout_ms,
                nodes,
            } => {
                if let Some(description) = description {
                    writeln!(f, "{description}")?;
                }
                writeln!(f, "{} node(s), timeout {timeout_ms}ms", nodes.len())?;
                for node in nodes {
                    let marker = if node.leader { "*" } else { " " };
                    write!(f, "{marker} {} {} -> {}", node.id, node.address, node.client_url)?;
                    if let Some(description) = &node.description {
                        write!(f, " ({description})")?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            CommandResult::Leader { url, .. } => writeln!(f, "{url}"),
            CommandResult::Address {
                conn_type,
                host,
                port,
                network_address,
            } => {
                writeln!(f, "type:    {conn_type}")?;
                writeln!(f, "host:    {host}")?;
                writeln!(f, "port:    {port}")?;
                writeln!(f, "network: {network_address}")
            }
        }
    }
}
