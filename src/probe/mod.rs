//! Probe engine - runs the TCP and UDP probes across a set of hosts.
//!
//! Hosts are probed host-major, port-minor. The ports of one host always run
//! one after another and write into a single `HostReport`; separate hosts may
//! be probed concurrently. A failed probe is an unreachable result and never
//! stops the run.

pub mod rate_limiter;
pub mod resolve;
pub mod tcp;
pub mod traits;
pub mod udp;

use crate::report::{HostReport, RunReport};
use crate::types::{Host, PortList, PortSpec, Protocol};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub use rate_limiter::RateLimiter;
pub use resolve::HostResolver;
pub use tcp::{TcpProbe, DEFAULT_TCP_TIMEOUT};
pub use traits::{NoopObserver, Probe, ProbeObserver, ProbeResult, Prober};
pub use udp::{UdpProbe, DEFAULT_SOURCE_PORT, DEFAULT_UDP_TIMEOUT, STUN_BINDING_REQUEST};

/// Settings for building a `ProbeEngine` and scheduling a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// TCP connect timeout.
    pub tcp_timeout: Duration,
    /// Wait for a reply to the UDP binding probe.
    pub udp_timeout: Duration,
    /// Local port for UDP probes, `None` for ephemeral.
    pub udp_source_port: Option<u16>,
    /// Number of hosts probed at the same time.
    pub concurrency: usize,
    /// Probe starts per second, 0 for unlimited.
    pub rate_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tcp_timeout: DEFAULT_TCP_TIMEOUT,
            udp_timeout: DEFAULT_UDP_TIMEOUT,
            udp_source_port: Some(DEFAULT_SOURCE_PORT),
            concurrency: 1,
            rate_limit: 0,
        }
    }
}

impl EngineConfig {
    pub fn with_tcp_timeout(mut self, timeout: Duration) -> Self {
        self.tcp_timeout = timeout;
        self
    }

    pub fn with_udp_timeout(mut self, timeout: Duration) -> Self {
        self.udp_timeout = timeout;
        self
    }

    pub fn with_udp_source_port(mut self, port: Option<u16>) -> Self {
        self.udp_source_port = port;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_rate_limit(mut self, rate: u32) -> Self {
        self.rate_limit = rate;
        self
    }

    /// Resolve settings that cannot hold together.
    ///
    /// Concurrent UDP probes cannot share one fixed source port, so the
    /// source port becomes ephemeral when more than one host runs at once.
    pub fn effective(mut self) -> Self {
        self.concurrency = self.concurrency.max(1);
        if self.concurrency > 1 {
            if let Some(port) = self.udp_source_port.take() {
                info!(
                    source_port = port,
                    concurrency = self.concurrency,
                    "using ephemeral UDP source ports for concurrent probes"
                );
            }
        }
        self
    }
}

/// Dispatches each port specification to the TCP or UDP probe.
#[derive(Debug, Clone)]
pub struct ProbeEngine {
    tcp: TcpProbe,
    udp: UdpProbe,
}

impl ProbeEngine {
    /// Build an engine. The configuration is normalised with
    /// [`EngineConfig::effective`] first.
    pub fn new(resolver: HostResolver, config: &EngineConfig) -> Self {
        let config = config.clone().effective();
        Self {
            tcp: TcpProbe::new(resolver.clone(), config.tcp_timeout),
            udp: UdpProbe::new(resolver, config.udp_timeout, config.udp_source_port),
        }
    }

    /// Engine using the system DNS configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(HostResolver::from_system(), config)
    }
}

#[async_trait]
impl Prober for ProbeEngine {
    async fn probe(&self, host: &Host, spec: PortSpec) -> ProbeResult {
        match spec.protocol() {
            Protocol::Udp => self.udp.probe(host, spec.port()).await,
            Protocol::Tcp => self.tcp.probe(host, spec.port()).await,
        }
    }

    fn fixed_source_port(&self) -> Option<u16> {
        self.udp.source_port()
    }
}

/// What to probe and how to schedule it.
#[derive(Debug, Clone)]
pub struct ProbeJob {
    /// Identity recorded as the source of every host report.
    pub source: Host,
    /// Hosts in report order.
    pub targets: Vec<Host>,
    /// Ports in probe and column order.
    pub ports: PortList,
    /// Number of hosts probed at the same time.
    pub concurrency: usize,
    /// Probe starts per second, 0 for unlimited.
    pub rate_limit: u32,
}

impl ProbeJob {
    pub fn new(source: Host, targets: Vec<Host>, ports: PortList) -> Self {
        Self {
            source,
            targets,
            ports,
            concurrency: 1,
            rate_limit: 0,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_rate_limit(mut self, rate: u32) -> Self {
        self.rate_limit = rate;
        self
    }

    /// Take scheduling settings from an engine configuration.
    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_concurrency(config.concurrency)
            .with_rate_limit(config.rate_limit)
    }

    pub fn total_probes(&self) -> usize {
        self.targets.len() * self.ports.len()
    }
}

/// Probe every port of every target and collect the results.
///
/// Always returns one `HostReport` per target, in target order, after every
/// dispatched probe has returned.
pub async fn run_probes<P>(job: &ProbeJob, prober: &P, observer: &dyn ProbeObserver) -> RunReport
where
    P: Prober + ?Sized,
{
    let started_at = Utc::now();
    let start = Instant::now();
    let limiter = RateLimiter::per_second(job.rate_limit);
    let concurrency = schedule_concurrency(job, prober);

    info!(
        hosts = job.targets.len(),
        ports = %job.ports,
        concurrency,
        "starting probe run"
    );
    observer.run_started(job.targets.len(), job.total_probes());

    let hosts: Vec<HostReport> = stream::iter(&job.targets)
        .map(|target| probe_host(job, target, prober, observer, limiter.as_ref()))
        .buffered(concurrency)
        .collect()
        .await;

    let report = RunReport {
        source: job.source.clone(),
        started_at,
        completed_at: Utc::now(),
        duration_ms: start.elapsed().as_millis() as u64,
        hosts,
    };

    info!(summary = %report.summary(), "probe run complete");
    observer.run_finished(&report);
    report
}

/// Number of hosts to probe at once.
///
/// UDP probes bound to one fixed local port have to run one at a time, so
/// such a job falls back to the sequential schedule.
fn schedule_concurrency<P>(job: &ProbeJob, prober: &P) -> usize
where
    P: Prober + ?Sized,
{
    let requested = job.concurrency.max(1);
    match prober.fixed_source_port() {
        Some(port) if requested > 1 && job.ports.has_udp() => {
            warn!(
                source_port = port,
                requested,
                "UDP source port is fixed, probing hosts one at a time"
            );
            1
        }
        _ => requested,
    }
}

async fn probe_host<P>(
    job: &ProbeJob,
    target: &Host,
    prober: &P,
    observer: &dyn ProbeObserver,
    limiter: Option<&RateLimiter>,
) -> HostReport
where
    P: Prober + ?Sized,
{
    let mut report = HostReport::new(job.source.clone(), target.clone());

    for &spec in &job.ports {
        if let Some(limiter) = limiter {
            limiter.wait().await;
        }

        observer.probe_started(target, spec);
        let result = prober.probe(target, spec).await;
        observer.probe_finished(target, spec, &result);

        report.record(result);
    }

    debug!(
        %target,
        reachable = report.reachable_count(),
        probed = report.results().len(),
        "host complete"
    );
    report
}
