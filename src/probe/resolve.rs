//! Host name resolution shared by the probes.

use crate::error::ProbeError;
use crate::types::Host;
use std::net::IpAddr;
use std::sync::Arc;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Cheaply clonable DNS resolver.
///
/// Prefers the system resolver configuration so internal edge names resolve
/// the same way they do for other tools on the host.
#[derive(Clone)]
pub struct HostResolver {
    inner: Arc<TokioAsyncResolver>,
}

impl HostResolver {
    /// Resolver using the system configuration, or public defaults when the
    /// system configuration cannot be read.
    pub fn from_system() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "system resolver configuration unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self {
            inner: Arc::new(resolver),
        }
    }

    /// Resolve a host to its first address. IP literals are returned as-is.
    pub async fn resolve(&self, host: &Host) -> Result<IpAddr, ProbeError> {
        if let Some(ip) = host.ip() {
            return Ok(ip);
        }

        let response = self
            .inner
            .lookup_ip(host.as_str())
            .await
            .map_err(|e| ProbeError::DnsResolution(format!("{}: {}", host, e)))?;

        response
            .iter()
            .next()
            .ok_or_else(|| ProbeError::DnsResolution(format!("{}: no addresses", host)))
    }
}

impl std::fmt::Debug for HostResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_ip_literal_bypasses_dns() {
        let resolver = HostResolver::from_system();
        let host = Host::parse("127.0.0.1").unwrap();
        let ip = resolver.resolve(&host).await.unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_unresolvable_name() {
        let resolver = HostResolver::from_system();
        let host = Host::parse("edge.nonexistent.invalid").unwrap();
        assert!(matches!(
            resolver.resolve(&host).await,
            Err(ProbeError::DnsResolution(_))
        ));
    }
}
