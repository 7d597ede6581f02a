//! Host identifiers and target lists.
//!
//! A `Host` is whatever the operator or the topology named: a fully
//! qualified domain name, a short name, or an IP literal. It is resolved
//! lazily by the probes, so an unresolvable name yields an unreachable
//! result instead of an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Environment variable overriding the local host identity.
pub const SOURCE_HOST_ENV: &str = "EDGECHECK_SOURCE_HOST";

/// An immutable host identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Host(String);

impl Host {
    /// Parse and validate a host identifier.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::Empty);
        }
        if s.parse::<IpAddr>().is_ok() || is_valid_hostname(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(TargetError::InvalidFormat(s.to_string()))
        }
    }

    /// Identity of the machine running the checks.
    ///
    /// Uses `EDGECHECK_SOURCE_HOST` when set, otherwise the OS hostname.
    pub fn local() -> Self {
        std::env::var(SOURCE_HOST_ENV)
            .ok()
            .and_then(|h| Self::parse(&h).ok())
            .or_else(|| os_hostname().and_then(|h| Self::parse(&h).ok()))
            .unwrap_or_else(|| Self("localhost".to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The host as an IP address, when it is an IP literal.
    pub fn ip(&self) -> Option<IpAddr> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Host {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Host {
    type Error = TargetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Host> for String {
    fn from(host: Host) -> Self {
        host.0
    }
}

/// Error type for host parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid host: {0}")]
    InvalidFormat(String),
    #[error("empty target list")]
    Empty,
}

/// Ordered list of hosts given on the command line.
///
/// Accepts hosts separated by commas, spaces, or both. Duplicates are kept
/// and probed independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostList(Vec<Host>);

impl HostList {
    pub fn into_vec(self) -> Vec<Host> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for HostList {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hosts = s
            .split([',', ' ', '\t'])
            .filter(|t| !t.is_empty())
            .map(Host::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if hosts.is_empty() {
            return Err(TargetError::Empty);
        }
        Ok(Self(hosts))
    }
}

#[cfg(unix)]
fn os_hostname() -> Option<String> {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
}

#[cfg(not(unix))]
fn os_hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok()
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // A trailing dot marks an absolute name
    let s = s.strip_suffix('.').unwrap_or(s);

    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if !label.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.ends_with(|c: char| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}
