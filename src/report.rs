//! Per-host and per-run reports.
//!
//! A `HostReport` holds one result per requested port specification, in
//! request order, and is owned by the task probing that host until it is
//! complete. A `RunReport` is the ordered collection of host reports handed
//! to the output and storage layers.

use crate::probe::ProbeResult;
use crate::types::Host;
use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Results for one target host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostReport {
    /// Host the probes were sent from.
    pub source: Host,
    /// Host the probes were sent to.
    pub target: Host,
    results: Vec<ProbeResult>,
}

impl HostReport {
    pub fn new(source: Host, target: Host) -> Self {
        Self {
            source,
            target,
            results: Vec::new(),
        }
    }

    /// Record a result under its label.
    ///
    /// A second result for the same label replaces the first and keeps the
    /// first one's position.
    pub fn record(&mut self, result: ProbeResult) {
        let label = result.label();
        match self.results.iter_mut().find(|r| r.label() == label) {
            Some(existing) => *existing = result,
            None => self.results.push(result),
        }
    }

    /// Reachability recorded for `label`, e.g. `"TCP443"`.
    pub fn get(&self, label: &str) -> Option<bool> {
        self.results
            .iter()
            .find(|r| r.label() == label)
            .map(|r| r.reachable)
    }

    pub fn labels(&self) -> Vec<String> {
        self.results.iter().map(ProbeResult::label).collect()
    }

    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    pub fn reachable_count(&self) -> usize {
        self.results.iter().filter(|r| r.reachable).count()
    }

    pub fn all_reachable(&self) -> bool {
        self.results.iter().all(|r| r.reachable)
    }
}

// Flat record: source, target, then one boolean per label.
impl Serialize for HostReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len() + 2))?;
        map.serialize_entry("source", &self.source)?;
        map.serialize_entry("target", &self.target)?;
        for result in &self.results {
            map.serialize_entry(&result.label(), &result.reachable)?;
        }
        map.end()
    }
}

/// Results of one complete run, one entry per target host in target order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Host the run was executed on.
    pub source: Host,
    /// When the first probe was dispatched.
    pub started_at: DateTime<Utc>,
    /// When the last probe returned.
    pub completed_at: DateTime<Utc>,
    /// Total run duration in milliseconds.
    pub duration_ms: u64,
    /// Host reports in target order.
    pub hosts: Vec<HostReport>,
}

impl RunReport {
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Column labels shared by every host report.
    pub fn labels(&self) -> Vec<String> {
        self.hosts.first().map(HostReport::labels).unwrap_or_default()
    }

    /// Hosts on which no probe succeeded.
    pub fn unreachable_hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts
            .iter()
            .filter(|h| h.reachable_count() == 0)
            .map(|h| &h.target)
    }

    /// Short summary line.
    pub fn summary(&self) -> String {
        let probes: usize = self.hosts.iter().map(|h| h.results().len()).sum();
        let reachable: usize = self.hosts.iter().map(HostReport::reachable_count).sum();
        format!(
            "{} hosts, {}/{} probes reachable [{:.2}s]",
            self.hosts.len(),
            reachable,
            probes,
            self.duration_ms as f64 / 1000.0
        )
    }
}
