//! TCP connect probe.
//!
//! Completes a TCP handshake with the target and closes the connection
//! straight away. No application data is exchanged.

use crate::error::ProbeError;
use crate::probe::resolve::HostResolver;
use crate::probe::traits::Probe;
use crate::types::{Host, Port, Protocol};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default connect timeout.
pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_millis(3000);

/// TCP connect probe.
///
/// Resolution and connection share one deadline, so a host that never
/// answers costs at most `timeout` per port.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    resolver: HostResolver,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(resolver: HostResolver, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    async fn connect(&self, host: &Host, port: Port) -> Result<TcpStream, ProbeError> {
        let ip = self.resolver.resolve(host).await?;
        let addr = SocketAddr::new(ip, port.as_u16());

        TcpStream::connect(addr)
            .await
            .map_err(|e| classify(host, port, e))
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, host: &Host, port: Port) -> Result<(), ProbeError> {
        match timeout(self.timeout, self.connect(host, port)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

fn classify(host: &Host, port: Port, e: io::Error) -> ProbeError {
    if e.kind() == io::ErrorKind::ConnectionRefused {
        return ProbeError::ConnectionRefused;
    }

    let error_str = e.to_string().to_lowercase();
    if error_str.contains("unreachable") {
        if error_str.contains("host") {
            ProbeError::HostUnreachable
        } else {
            ProbeError::NetworkUnreachable(e.to_string())
        }
    } else {
        ProbeError::ConnectionFailed {
            target: host.to_string(),
            port: port.as_u16(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn probe(timeout: Duration) -> TcpProbe {
        TcpProbe::new(HostResolver::from_system(), timeout)
    }

    fn localhost() -> Host {
        Host::parse("127.0.0.1").unwrap()
    }

    #[tokio::test]
    async fn test_open_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let result = probe(Duration::from_secs(1)).probe(&localhost(), port).await;
        assert!(result.reachable);
        assert_eq!(result.label(), format!("TCP{}", port));
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        drop(listener);

        let tcp = probe(Duration::from_secs(1));
        let err = tcp.attempt(&localhost(), port).await.unwrap_err();
        assert!(matches!(err, ProbeError::ConnectionRefused));
        assert!(!tcp.probe(&localhost(), port).await.reachable);
    }

    #[tokio::test]
    async fn test_unroutable_host_is_bounded() {
        let tcp = probe(Duration::from_millis(200));
        let host = Host::parse("10.255.255.1").unwrap();

        let start = Instant::now();
        let result = tcp.probe(&host, Port::new(443).unwrap()).await;
        assert!(!result.reachable);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_unreachable() {
        let tcp = probe(Duration::from_secs(10));
        let host = Host::parse("edge.nonexistent.invalid").unwrap();
        assert!(!tcp.probe(&host, Port::new(443).unwrap()).await.reachable);
    }

    #[tokio::test]
    async fn test_probe_metadata() {
        let tcp = probe(DEFAULT_TCP_TIMEOUT);
        assert_eq!(tcp.protocol(), Protocol::Tcp);
        assert_eq!(tcp.timeout(), Duration::from_millis(3000));
    }
}
