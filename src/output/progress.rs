//! Console progress reporting for probe runs.

use crate::probe::{ProbeObserver, ProbeResult};
use crate::report::RunReport;
use crate::types::{Host, PortSpec};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar plus one line per completed probe.
#[derive(Debug)]
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(bar_style.progress_chars("=>-"));
        }
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Line printed when a probe completes.
pub fn outcome_line(host: &Host, spec: PortSpec, result: &ProbeResult) -> String {
    let status = if result.reachable {
        style("reachable").green().to_string()
    } else {
        style("unreachable").red().to_string()
    };
    format!("{} {} is {}", host, spec.label(), status)
}

impl ProbeObserver for ConsoleProgress {
    fn run_started(&self, _hosts: usize, probes: usize) {
        self.bar.set_length(probes as u64);
    }

    fn probe_started(&self, host: &Host, spec: PortSpec) {
        self.bar
            .set_message(format!("Testing connection to {} on port {}", host, spec.label()));
    }

    fn probe_finished(&self, host: &Host, spec: PortSpec, result: &ProbeResult) {
        self.bar.println(outcome_line(host, spec, result));
        self.bar.inc(1);
    }

    fn run_finished(&self, _report: &RunReport) {
        self.bar.finish_and_clear();
    }
}
