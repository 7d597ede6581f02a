//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `edgecheck probe` - Probe edge servers and report reachability
//! - `edgecheck hosts` - List the edge servers a topology yields

mod hosts;
mod probe;

pub use hosts::HostsCommand;
pub use probe::ProbeCommand;

use crate::config::{AppSettings, Paths};
use crate::discovery::TopologyFile;
use crate::error::CliResult;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// edgecheck - Connectivity checks against telephony edge servers.
///
/// Opens a TCP connection to each requested port of each edge server and
/// sends a STUN-style datagram to UDP 3478, then reports which ones answered.
#[derive(Parser, Debug)]
#[command(name = "edgecheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Edge server connectivity diagnostics", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH", env = "EDGECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the CSV report is written to
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe edge servers for reachability
    #[command(alias = "p")]
    Probe(ProbeCommand),

    /// List edge servers from the topology
    #[command(alias = "h")]
    Hosts(HostsCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Settings and global flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub verbose: bool,
    pub quiet: bool,
    pub settings: AppSettings,
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    /// Load settings and collect the global flags.
    pub fn context(&self) -> CliResult<Context> {
        let settings = match &self.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };

        Ok(Context {
            verbose: self.verbose,
            quiet: self.quiet,
            settings,
            output_dir: self.output_dir.clone(),
        })
    }

    /// Run the selected subcommand.
    pub async fn execute(&self) -> CliResult<()> {
        let ctx = self.context()?;
        match &self.command {
            Commands::Probe(cmd) => cmd.execute(&ctx).await,
            Commands::Hosts(cmd) => cmd.execute(&ctx).await,
        }
    }
}

/// Locate and load the topology document.
///
/// An explicit path wins over the settings file, which wins over the
/// default location in the config directory.
pub fn load_topology(explicit: Option<&Path>, settings: &AppSettings) -> CliResult<TopologyFile> {
    let path = match (explicit, &settings.topology_file) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(path)) => path.clone(),
        (None, None) => Paths::get()?.topology_file(),
    };

    tracing::debug!(path = %path.display(), "loading topology");
    Ok(TopologyFile::load(&path)?)
}
