//! Configuration settings for petune
//!
//! Defines the CLI arguments and the runtime configuration derived from them.

use crate::calculate::AgentWorkload;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// petune - Puppet Enterprise tuning recommendations
#[derive(Parser, Debug, Clone)]
#[command(name = "petune")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recommend Puppet Enterprise service settings from host resources")]
#[command(long_about = r#"
petune reads the hosts of a Puppet Enterprise infrastructure and the roles they
play, and recommends settings for the services on each host: Puppet Server
workers and heap, PuppetDB threads and heap, PostgreSQL shared buffers, and the
console, orchestrator and broker heaps.

Examples:
  petune --local                            # Tune this host as a monolithic master
  petune --inventory inventory.yaml         # Tune every host in an inventory
  petune -i inventory.yaml --common         # Factor out settings shared by all hosts
  petune -i inventory.yaml --hiera hiera/   # Write Hiera data files
  petune facts                              # Show the resources of this host
"#)]
pub struct CliArgs {
    /// Inventory file describing nodes and roles (YAML, or JSON by extension)
    #[arg(short = 'i', long, value_name = "FILE", conflicts_with = "local")]
    pub inventory: Option<PathBuf>,

    /// Tune the local host as a monolithic master
    #[arg(short = 'l', long)]
    pub local: bool,

    /// Extract settings common to all hosts
    #[arg(long)]
    pub common: bool,

    /// Do not enforce minimum system requirements
    #[arg(long)]
    pub force: bool,

    /// Reserve a code cache for each Puppet Server worker (JRuby 9k)
    #[arg(long)]
    pub code_cache: bool,

    /// Write settings as Hiera data files into DIR
    #[arg(long, value_name = "DIR")]
    pub hiera: Option<PathBuf>,

    /// Output format for the report
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Agent run interval in seconds
    #[arg(long, default_value = "1800", value_name = "SECS")]
    pub run_interval: u64,

    /// Average catalog compile time in seconds
    #[arg(long, default_value = "20", value_name = "SECS")]
    pub compile_time: u64,

    /// Number of active agents, for worker sizing
    #[arg(long, value_name = "NUM")]
    pub active_nodes: Option<u64>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the resources of this host and whether it meets minimum requirements
    #[command(name = "facts")]
    Facts,
}

/// Output format for reports
#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Runtime configuration for a tuning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuneConfig {
    /// Inventory file, unless tuning the local host
    pub inventory: Option<PathBuf>,
    /// Tune the local host
    pub local: bool,
    /// Extract common settings
    pub common: bool,
    /// Skip the minimum requirements gate
    pub force: bool,
    /// Size per-worker code cache
    pub code_cache: bool,
    /// Hiera output directory
    pub hiera_dir: Option<PathBuf>,
    /// Report format
    pub format: OutputFormat,
    /// Agent workload for capacity estimates
    pub workload: AgentWorkload,
}

impl Default for TuneConfig {
    fn default() -> Self {
        Self {
            inventory: None,
            local: true,
            common: false,
            force: false,
            code_cache: false,
            hiera_dir: None,
            format: OutputFormat::Text,
            workload: AgentWorkload::default(),
        }
    }
}

impl TuneConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        if args.run_interval == 0 {
            return Err("Run interval must be at least one second".to_string());
        }
        if args.compile_time == 0 {
            return Err("Compile time must be at least one second".to_string());
        }

        Ok(Self {
            inventory: args.inventory.clone(),
            local: args.local || args.inventory.is_none(),
            common: args.common,
            force: args.force,
            code_cache: args.code_cache,
            hiera_dir: args.hiera.clone(),
            format: args.format,
            workload: AgentWorkload {
                run_interval: args.run_interval,
                average_compile_time: args.compile_time,
                active_nodes: args.active_nodes,
            },
        })
    }
}
