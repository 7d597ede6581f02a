//! Probe trait abstractions.
//!
//! `Probe` is implemented once per transport and owns the rule that a
//! failed attempt is an unreachable result, never an error. `Prober` is the
//! seam the orchestrator dispatches through, and `ProbeObserver` receives
//! the begin/end notifications for every probe.

use crate::error::ProbeError;
use crate::report::RunReport;
use crate::types::{Host, Port, PortSpec, Protocol};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of probing one port on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Protocol used for the probe.
    pub protocol: Protocol,
    /// The port that was probed.
    pub port: Port,
    /// Whether the handshake completed (TCP) or any reply arrived (UDP).
    pub reachable: bool,
    /// Time to success in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl ProbeResult {
    pub fn new(protocol: Protocol, port: Port, reachable: bool) -> Self {
        Self {
            protocol,
            port,
            reachable,
            response_time_ms: None,
        }
    }

    pub fn reachable(spec: PortSpec) -> Self {
        Self::new(spec.protocol(), spec.port(), true)
    }

    pub fn unreachable(spec: PortSpec) -> Self {
        Self::new(spec.protocol(), spec.port(), false)
    }

    /// Set the response time.
    pub fn with_response_time(mut self, time_ms: u64) -> Self {
        self.response_time_ms = Some(time_ms);
        self
    }

    /// Column label, e.g. `TCP443`.
    pub fn label(&self) -> String {
        format!("{}{}", self.protocol, self.port)
    }
}

/// A single-transport reachability probe.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Protocol this probe speaks.
    fn protocol(&self) -> Protocol;

    /// Upper bound on waiting for the remote side.
    fn timeout(&self) -> Duration;

    /// Make one attempt against `host:port`.
    async fn attempt(&self, host: &Host, port: Port) -> Result<(), ProbeError>;

    /// Probe `host:port`, folding any failure into an unreachable result.
    async fn probe(&self, host: &Host, port: Port) -> ProbeResult {
        let protocol = self.protocol();
        let start = Instant::now();

        match self.attempt(host, port).await {
            Ok(()) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(%host, %protocol, %port, elapsed_ms = elapsed, "reachable");
                ProbeResult::new(protocol, port, true).with_response_time(elapsed)
            }
            Err(e) => {
                debug!(
                    %host,
                    %protocol,
                    %port,
                    error = %e,
                    timeout_ms = self.timeout().as_millis() as u64,
                    "unreachable"
                );
                ProbeResult::new(protocol, port, false)
            }
        }
    }
}

/// Dispatches a port specification to the right probe.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, host: &Host, spec: PortSpec) -> ProbeResult;

    /// Local port every UDP probe is sent from, if it is fixed.
    ///
    /// Two UDP probes sharing a fixed port cannot be in flight at once.
    fn fixed_source_port(&self) -> Option<u16> {
        None
    }
}

/// Receives progress notifications while a run is in flight.
///
/// Notifications may arrive from several hosts concurrently.
pub trait ProbeObserver: Send + Sync {
    fn run_started(&self, _hosts: usize, _probes: usize) {}

    fn probe_started(&self, _host: &Host, _spec: PortSpec) {}

    fn probe_finished(&self, _host: &Host, _spec: PortSpec, _result: &ProbeResult) {}

    fn run_finished(&self, _report: &RunReport) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProbeObserver for NoopObserver {}
