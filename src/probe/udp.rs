//! UDP binding probe.
//!
//! Sends one fixed STUN binding request to the target and waits for any
//! datagram in return. The reply is not parsed and its sender is not
//! checked: receiving anything means the path through the intervening
//! firewalls and NAT is open.

use crate::error::ProbeError;
use crate::probe::resolve::HostResolver;
use crate::probe::traits::Probe;
use crate::types::{Host, Port, Protocol};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Default wait for a reply.
pub const DEFAULT_UDP_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default local port the probe is sent from.
pub const DEFAULT_SOURCE_PORT: u16 = 50000;

/// Size of the binding request on the wire.
pub const PROBE_LEN: usize = 100;

const BINDING_REQUEST: u16 = 0x0001;
const MAGIC_COOKIE: u32 = 0x2112_A442;
const TRANSACTION_ID: [u8; 12] = *b"edgecheck-01";
const ATTR_SOFTWARE: u16 = 0x8022;
const ATTR_PADDING: u16 = 0x0026;
const SOFTWARE: [u8; 16] = *b"edgecheck probe ";
const HEADER_LEN: usize = 20;

/// The binding request sent by every UDP probe.
///
/// STUN header (binding request, fixed transaction id), a SOFTWARE
/// attribute and a zeroed PADDING attribute filling the message to
/// `PROBE_LEN` bytes.
pub static STUN_BINDING_REQUEST: [u8; PROBE_LEN] = binding_request();

const fn binding_request() -> [u8; PROBE_LEN] {
    let mut buf = [0u8; PROBE_LEN];

    let header = [
        BINDING_REQUEST.to_be_bytes(),
        ((PROBE_LEN - HEADER_LEN) as u16).to_be_bytes(),
    ];
    let cookie = MAGIC_COOKIE.to_be_bytes();
    buf[0] = header[0][0];
    buf[1] = header[0][1];
    buf[2] = header[1][0];
    buf[3] = header[1][1];
    let mut i = 0;
    while i < 4 {
        buf[4 + i] = cookie[i];
        i += 1;
    }
    i = 0;
    while i < TRANSACTION_ID.len() {
        buf[8 + i] = TRANSACTION_ID[i];
        i += 1;
    }

    let software = [ATTR_SOFTWARE.to_be_bytes(), (SOFTWARE.len() as u16).to_be_bytes()];
    let mut at = HEADER_LEN;
    buf[at] = software[0][0];
    buf[at + 1] = software[0][1];
    buf[at + 2] = software[1][0];
    buf[at + 3] = software[1][1];
    at += 4;
    i = 0;
    while i < SOFTWARE.len() {
        buf[at + i] = SOFTWARE[i];
        i += 1;
    }
    at += SOFTWARE.len();

    let padding = [
        ATTR_PADDING.to_be_bytes(),
        ((PROBE_LEN - at - 4) as u16).to_be_bytes(),
    ];
    buf[at] = padding[0][0];
    buf[at + 1] = padding[0][1];
    buf[at + 2] = padding[1][0];
    buf[at + 3] = padding[1][1];

    buf
}

/// UDP binding probe.
#[derive(Debug, Clone)]
pub struct UdpProbe {
    resolver: HostResolver,
    timeout: Duration,
    source_port: Option<u16>,
}

impl UdpProbe {
    /// Create a UDP probe.
    ///
    /// # Arguments
    /// * `timeout` - How long to wait for a reply
    /// * `source_port` - Local port to send from, `None` for an ephemeral port
    pub fn new(resolver: HostResolver, timeout: Duration, source_port: Option<u16>) -> Self {
        Self {
            resolver,
            timeout,
            source_port,
        }
    }

    pub fn source_port(&self) -> Option<u16> {
        self.source_port
    }
}

#[async_trait]
impl Probe for UdpProbe {
    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, host: &Host, port: Port) -> Result<(), ProbeError> {
        // Resolution gets its own deadline; the reply wait keeps the full timeout
        let ip = timeout(self.timeout, self.resolver.resolve(host))
            .await
            .map_err(|_| ProbeError::Timeout)??;
        let local_port = self.source_port.unwrap_or(0);
        let local_ip = match ip {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };

        let socket = UdpSocket::bind(SocketAddr::new(local_ip, local_port))
            .await
            .map_err(|e| ProbeError::Bind {
                port: local_port,
                reason: e.to_string(),
            })?;

        socket
            .send_to(&STUN_BINDING_REQUEST, SocketAddr::new(ip, port.as_u16()))
            .await?;

        let mut buf = [0u8; 1500];
        match timeout(self.timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => {
                tracing::trace!(%host, %from, len, "binding probe answered");
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn probe(timeout: Duration) -> UdpProbe {
        UdpProbe::new(HostResolver::from_system(), timeout, None)
    }

    fn localhost() -> Host {
        Host::parse("127.0.0.1").unwrap()
    }

    #[test]
    fn test_binding_request_layout() {
        let msg = &STUN_BINDING_REQUEST;
        assert_eq!(msg.len(), 100);
        assert_eq!(&msg[0..2], &[0x00, 0x01]);
        assert_eq!(u16::from_be_bytes([msg[2], msg[3]]), 80);
        assert_eq!(&msg[4..8], &[0x21, 0x12, 0xA4, 0x42]);
        assert_eq!(&msg[8..20], b"edgecheck-01");
        assert_eq!(u16::from_be_bytes([msg[20], msg[21]]), ATTR_SOFTWARE);
        assert_eq!(u16::from_be_bytes([msg[22], msg[23]]), 16);
        assert_eq!(&msg[24..40], b"edgecheck probe ");
        assert_eq!(u16::from_be_bytes([msg[40], msg[41]]), ATTR_PADDING);
        assert_eq!(u16::from_be_bytes([msg[42], msg[43]]), 56);
        assert!(msg[44..].iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn test_any_reply_is_reachable() {
        let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(responder.local_addr().unwrap().port()).unwrap();

        let server = tokio::spawn(async move {
            let mut buf = [0u8; 1500];
            let (len, from) = responder.recv_from(&mut buf).await.unwrap();
            responder.send_to(b"x", from).await.unwrap();
            buf[..len].to_vec()
        });

        let result = probe(Duration::from_secs(1)).probe(&localhost(), port).await;
        assert!(result.reachable);

        let received = server.await.unwrap();
        assert_eq!(received, STUN_BINDING_REQUEST.to_vec());
    }

    #[tokio::test]
    async fn test_silence_is_unreachable() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(silent.local_addr().unwrap().port()).unwrap();

        let udp = probe(Duration::from_millis(200));
        let start = Instant::now();
        let err = udp.attempt(&localhost(), port).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout));
        assert!(start.elapsed() < Duration::from_secs(2));
        drop(silent);
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_unreachable() {
        let udp = probe(Duration::from_millis(200));
        let host = Host::parse("edge.nonexistent.invalid").unwrap();
        let start = Instant::now();
        let result = udp.probe(&host, Port::new(3478).unwrap()).await;
        assert!(!result.reachable);
        assert_eq!(result.label(), "UDP3478");
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_sent_from_default_source_port() {
        let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(responder.local_addr().unwrap().port()).unwrap();

        let server = tokio::spawn(async move {
            let mut buf = [0u8; 1500];
            let (_, from) = responder.recv_from(&mut buf).await.unwrap();
            responder.send_to(b"x", from).await.unwrap();
            from.port()
        });

        let udp = UdpProbe::new(
            HostResolver::from_system(),
            Duration::from_secs(1),
            Some(DEFAULT_SOURCE_PORT),
        );
        assert_eq!(udp.source_port(), Some(50000));

        let result = udp.probe(&localhost(), port).await;
        assert!(result.reachable);
        assert_eq!(server.await.unwrap(), DEFAULT_SOURCE_PORT);
    }

    #[tokio::test]
    async fn test_busy_source_port_is_unreachable() {
        let holder = UdpSocket::bind("0.0.0.0:0").await.unwrap();
        let busy = holder.local_addr().unwrap().port();

        let udp = UdpProbe::new(
            HostResolver::from_system(),
            Duration::from_millis(200),
            Some(busy),
        );
        let err = udp
            .attempt(&localhost(), Port::new(3478).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Bind { port, .. } if port == busy));
    }
}
