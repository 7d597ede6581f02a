//! Error types for edgecheck.
//!
//! Uses `thiserror` for ergonomic error definitions. Probe errors are
//! collapsed into `reachable = false` at the probe boundary; the other
//! kinds abort a run before any probe is sent.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single probe attempt.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("connection to {target}:{port} failed: {reason}")]
    ConnectionFailed {
        target: String,
        port: u16,
        reason: String,
    },

    #[error("timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("host unreachable")]
    HostUnreachable,

    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    #[error("could not bind local port {port}: {reason}")]
    Bind { port: u16, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading settings or locating directories.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a home directory for configuration")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("--targets and --site are mutually exclusive")]
    ConflictingSelection,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors resolving the set of edge servers to probe.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("topology unavailable: {0}")]
    TopologyUnavailable(String),

    #[error("invalid topology document: {0}")]
    InvalidTopology(String),

    #[error("site '{0}' not found in topology")]
    SiteNotFound(String),

    #[error("no edge servers found{}", .0.as_ref().map(|s| format!(" for site '{}'", s)).unwrap_or_default())]
    NoHosts(Option<String>),
}

/// Errors persisting a run report.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("report directory error: {0}")]
    DirectoryError(String),

    #[error("failed to save report: {0}")]
    SaveFailed(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors surfaced by CLI command handlers.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Port(#[from] crate::types::PortError),

    #[error(transparent)]
    Target(#[from] crate::types::TargetError),

    #[error(transparent)]
    Selection(#[from] crate::discovery::SelectionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
pub type StorageResult<T> = Result<T, StorageError>;
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hosts_message() {
        assert_eq!(
            DiscoveryError::NoHosts(None).to_string(),
            "no edge servers found"
        );
        assert_eq!(
            DiscoveryError::NoHosts(Some("Dublin".to_string())).to_string(),
            "no edge servers found for site 'Dublin'"
        );
    }
}
