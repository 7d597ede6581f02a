//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortSpec` pairs a port with the protocol used to probe it, and `PortList`
//! holds the ordered set of specifications requested for a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Port answered by the UDP binding probe. Any requested port equal to this
/// value is probed over UDP; every other value is probed over TCP.
pub const STUN_PORT: u16 = 3478;

/// Ports probed when none are requested explicitly.
pub const DEFAULT_PORTS: [u16; 9] = [443, 4443, 5061, 5062, 8057, 50001, 50002, 50003, 3478];

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| PortError::OutOfRange(value.to_string()))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(String),
    #[error("invalid port list '{0}': only digits, spaces and commas are allowed")]
    InvalidCharacters(String),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("empty port specification")]
    Empty,
}

/// Transport protocol used for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

/// A single requested probe: a port and the protocol it is tested with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortSpec {
    protocol: Protocol,
    port: Port,
}

impl PortSpec {
    /// Classify a port. `STUN_PORT` is the only UDP port; everything else is TCP.
    pub const fn from_port(port: Port) -> Self {
        let protocol = if port.as_u16() == STUN_PORT {
            Protocol::Udp
        } else {
            Protocol::Tcp
        };
        Self { protocol, port }
    }

    /// The UDP binding probe specification.
    pub const fn stun() -> Self {
        Self::from_port(Port(STUN_PORT))
    }

    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub const fn port(&self) -> Port {
        self.port
    }

    pub fn is_udp(&self) -> bool {
        self.protocol == Protocol::Udp
    }

    /// Column label, e.g. `TCP443` or `UDP3478`.
    pub fn label(&self) -> String {
        format!("{}{}", self.protocol, self.port)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.port)
    }
}

/// Ordered list of port specifications.
///
/// Accepts lists separated by commas, spaces, or both:
/// - `"443"`
/// - `"443,5061,5062"`
/// - `"443, 5061 5062"`
///
/// Order is preserved since it determines probe order and report columns.
/// Duplicates are kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortList {
    specs: Vec<PortSpec>,
}

impl PortList {
    /// Build a list from raw port numbers.
    pub fn from_ports(ports: &[u16]) -> Result<Self, PortError> {
        if ports.is_empty() {
            return Err(PortError::Empty);
        }
        let specs = ports
            .iter()
            .map(|&p| Port::try_from(p).map(PortSpec::from_port))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { specs })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Check whether the list contains the UDP binding probe.
    pub fn has_udp(&self) -> bool {
        self.specs.iter().any(PortSpec::is_udp)
    }
}

impl Default for PortList {
    fn default() -> Self {
        Self {
            specs: DEFAULT_PORTS
                .iter()
                .map(|&p| PortSpec::from_port(Port(p)))
                .collect(),
        }
    }
}

impl FromStr for PortList {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == ',') {
            return Err(PortError::InvalidCharacters(s.to_string()));
        }

        let mut specs = Vec::new();
        for token in s.split([',', ' ']).filter(|t| !t.is_empty()) {
            let value: u32 = token
                .parse()
                .map_err(|_| PortError::InvalidFormat(token.to_string()))?;
            let port = u16::try_from(value)
                .ok()
                .and_then(Port::new)
                .ok_or_else(|| PortError::OutOfRange(token.to_string()))?;
            specs.push(PortSpec::from_port(port));
        }

        if specs.is_empty() {
            return Err(PortError::Empty);
        }

        Ok(Self { specs })
    }
}

impl fmt::Display for PortList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.specs.iter().map(|s| s.port().to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl<'a> IntoIterator for &'a PortList {
    type Item = &'a PortSpec;
    type IntoIter = std::slice::Iter<'a, PortSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(list: &PortList) -> Vec<u16> {
        list.iter().map(|s| s.port().as_u16()).collect()
    }

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(65535).is_some());
    }

    #[test]
    fn test_dispatch_rule() {
        let stun = PortSpec::from_port(Port::new(3478).unwrap());
        assert_eq!(stun.protocol(), Protocol::Udp);
        assert_eq!(stun.label(), "UDP3478");

        for p in [1, 443, 3479, 50003, 65535] {
            let spec = PortSpec::from_port(Port::new(p).unwrap());
            assert_eq!(spec.protocol(), Protocol::Tcp);
        }
        assert_eq!(
            PortSpec::from_port(Port::new(443).unwrap()).label(),
            "TCP443"
        );
    }

    #[test]
    fn test_parse_mixed_separators() {
        let list: PortList = "443, 5061 5062".parse().unwrap();
        assert_eq!(ports(&list), vec![443, 5061, 5062]);
    }

    #[test]
    fn test_parse_preserves_order_and_duplicates() {
        let list: PortList = "5061,443,443".parse().unwrap();
        assert_eq!(ports(&list), vec![5061, 443, 443]);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(
            "abc".parse::<PortList>(),
            Err(PortError::InvalidCharacters(_))
        ));
        assert!(matches!(
            "443;80".parse::<PortList>(),
            Err(PortError::InvalidCharacters(_))
        ));
        assert!(matches!(
            "1-100".parse::<PortList>(),
            Err(PortError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(matches!(
            "0".parse::<PortList>(),
            Err(PortError::OutOfRange(_))
        ));
        assert!(matches!(
            "65536".parse::<PortList>(),
            Err(PortError::OutOfRange(_))
        ));
        assert!(matches!(
            "99999999999".parse::<PortList>(),
            Err(PortError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!("".parse::<PortList>(), Err(PortError::Empty));
        assert_eq!(" , ,".parse::<PortList>(), Err(PortError::Empty));
    }

    #[test]
    fn test_default_ports() {
        let list = PortList::default();
        assert_eq!(ports(&list), DEFAULT_PORTS.to_vec());
        assert!(list.has_udp());
        let udp: Vec<_> = list.iter().filter(|s| s.is_udp()).collect();
        assert_eq!(udp.len(), 1);
        assert_eq!(udp[0].label(), "UDP3478");
    }

    #[test]
    fn test_explicit_stun_port_is_udp() {
        let list: PortList = "443 3478".parse().unwrap();
        let specs: Vec<_> = list.iter().collect();
        assert!(!specs[0].is_udp());
        assert!(specs[1].is_udp());
    }
}
