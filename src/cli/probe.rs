//! Probe subcommand implementation.
//!
//! Handles the `edgecheck probe` command: resolve targets, probe every
//! requested port on each of them, print and save the report.

use super::{load_topology, Context, OutputFormat};
use crate::discovery::{TargetSelection, TopologyFile};
use crate::error::CliResult;
use crate::output::{self, ConsoleProgress};
use crate::probe::{run_probes, EngineConfig, NoopObserver, ProbeEngine, ProbeJob, ProbeObserver};
use crate::report::RunReport;
use crate::storage::ReportStore;
use crate::types::{Host, PortList};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Probe edge servers for reachability.
#[derive(Parser, Debug, Default)]
pub struct ProbeCommand {
    /// Hosts to probe, separated by commas or spaces
    ///
    /// When omitted, the edge servers of the topology are probed.
    #[arg(short = 't', long, value_name = "LIST", conflicts_with = "site")]
    pub targets: Option<String>,

    /// Probe only the edge servers of this topology site
    #[arg(short = 's', long, value_name = "NAME")]
    pub site: Option<String>,

    /// Ports to probe (e.g., "443", "443,5061 3478"); 3478 is probed over UDP
    #[arg(short, long, value_name = "LIST")]
    pub ports: Option<String>,

    /// TCP connect timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Wait for a UDP reply in milliseconds
    #[arg(long, value_name = "MS")]
    pub udp_timeout: Option<u64>,

    /// Number of hosts probed at the same time
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Rate limit in probes per second (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate_limit: Option<u32>,

    /// Topology document to discover edge servers from
    #[arg(long, value_name = "PATH", env = "EDGECHECK_TOPOLOGY")]
    pub topology: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Don't save the CSV report
    #[arg(long)]
    pub no_save: bool,
}

impl ProbeCommand {
    /// Execute the probe command.
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let report = self.run(ctx).await?;
        let stdout = io::stdout();
        self.finish(ctx, &report, &mut stdout.lock())
    }

    /// Print the report, then save it.
    ///
    /// The report is written to `out` before the save is attempted, so a
    /// storage failure is still reported as an error but never hides results.
    fn finish<W: Write>(&self, ctx: &Context, report: &RunReport, out: &mut W) -> CliResult<()> {
        let format = self.output_format(ctx);
        output::write_results(report, format, out)?;
        out.flush()?;

        if self.no_save || !ctx.settings.auto_save_reports {
            return Ok(());
        }

        let store = match &ctx.output_dir {
            Some(dir) => ReportStore::new(dir)?,
            None => ReportStore::default_location()?,
        };
        let path = store.save(report)?;

        if !ctx.quiet && format == OutputFormat::Plain {
            output::print_info(&format!("Report saved to {}", path.display()));
        }
        Ok(())
    }

    /// Resolve targets and run every probe, without printing the report.
    pub async fn run(&self, ctx: &Context) -> CliResult<RunReport> {
        // Validate ports before touching the network
        let ports = match &self.ports {
            Some(list) => list.parse::<PortList>()?,
            None => PortList::default(),
        };

        let selection = TargetSelection::from_args(self.targets.as_deref(), self.site.as_deref())?;
        let topology = if selection.needs_topology() {
            load_topology(self.topology.as_deref(), &ctx.settings)?
        } else {
            TopologyFile::default()
        };
        let targets = selection.resolve(&topology).await?;

        let config = self.engine_config(ctx).effective();
        let source = Host::local();
        let format = self.output_format(ctx);
        let interactive = !ctx.quiet && format == OutputFormat::Plain;

        if interactive {
            output::print_run_header(&source, targets.len(), &ports);
        }

        let progress;
        let observer: &dyn ProbeObserver = if interactive {
            progress = ConsoleProgress::new();
            &progress
        } else {
            &NoopObserver
        };

        let engine = ProbeEngine::from_config(&config);
        let job = ProbeJob::new(source, targets, ports).with_config(&config);

        Ok(run_probes(&job, &engine, observer).await)
    }

    /// Settings file values overridden by command-line flags.
    fn engine_config(&self, ctx: &Context) -> EngineConfig {
        let mut config = ctx.settings.engine_config();

        if let Some(ms) = self.timeout {
            config = config.with_tcp_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.udp_timeout {
            config = config.with_udp_timeout(Duration::from_millis(ms));
        }
        if let Some(n) = self.concurrency {
            config = config.with_concurrency(n);
        }
        if let Some(rate) = self.rate_limit {
            config = config.with_rate_limit(rate);
        }

        config
    }

    fn output_format(&self, ctx: &Context) -> OutputFormat {
        if let Some(format) = self.output {
            return format;
        }

        ctx.settings
            .default_output_format
            .parse()
            .unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "falling back to plain output");
                OutputFormat::Plain
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppSettings;
    use crate::error::{CliError, DiscoveryError};
    use tempfile::tempdir;
    use tokio::net::TcpListener;

    fn quiet_context() -> Context {
        Context {
            quiet: true,
            ..Context::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_ports_rejected_before_probing() {
        let cmd = ProbeCommand {
            targets: Some("edge1".to_string()),
            ports: Some("443,http".to_string()),
            ..ProbeCommand::default()
        };

        let err = cmd.run(&quiet_context()).await.unwrap_err();
        assert!(matches!(err, CliError::Port(_)));
    }

    #[tokio::test]
    async fn test_conflicting_selection_rejected() {
        let cmd = ProbeCommand {
            targets: Some("edge1".to_string()),
            site: Some("Dublin".to_string()),
            ..ProbeCommand::default()
        };

        let err = cmd.run(&quiet_context()).await.unwrap_err();
        assert!(matches!(err, CliError::Selection(_)));
    }

    #[tokio::test]
    async fn test_empty_site_is_fatal() {
        let dir = tempdir().unwrap();
        let topology = dir.path().join("topology.json");
        std::fs::write(&topology, r#"{"sites":[{"name":"Empty"}]}"#).unwrap();

        let cmd = ProbeCommand {
            site: Some("Empty".to_string()),
            topology: Some(topology),
            ..ProbeCommand::default()
        };

        let err = cmd.run(&quiet_context()).await.unwrap_err();
        assert!(matches!(err, CliError::Discovery(DiscoveryError::NoHosts(_))));
    }

    #[tokio::test]
    async fn test_probe_loopback_and_save() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().port();
        let closed = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().port()
        };
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let dir = tempdir().unwrap();
        let ctx = Context {
            quiet: true,
            output_dir: Some(dir.path().to_path_buf()),
            settings: AppSettings {
                tcp_timeout_ms: 500,
                ..AppSettings::default()
            },
            ..Context::default()
        };
        let cmd = ProbeCommand {
            targets: Some("127.0.0.1".to_string()),
            ports: Some(format!("{},{}", open, closed)),
            output: Some(OutputFormat::Csv),
            ..ProbeCommand::default()
        };

        let report = cmd.run(&ctx).await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.hosts[0].get(&format!("TCP{}", open)), Some(true));
        assert_eq!(report.hosts[0].get(&format!("TCP{}", closed)), Some(false));

        cmd.execute(&ctx).await.unwrap();
        let saved = ReportStore::new(dir.path())
            .unwrap()
            .report_path(&Host::local());
        let content = std::fs::read_to_string(saved).unwrap();
        assert!(content.starts_with(&format!("source,target,TCP{},TCP{}", open, closed)));
        assert!(content.contains("127.0.0.1,True,False"));
    }

    #[tokio::test]
    async fn test_report_printed_when_save_fails() {
        let dir = tempdir().unwrap();
        let not_a_dir = dir.path().join("not-a-dir");
        std::fs::write(&not_a_dir, "").unwrap();

        let ctx = Context {
            quiet: true,
            output_dir: Some(not_a_dir),
            settings: AppSettings {
                tcp_timeout_ms: 500,
                ..AppSettings::default()
            },
            ..Context::default()
        };
        let cmd = ProbeCommand {
            targets: Some("127.0.0.1".to_string()),
            ports: Some("1".to_string()),
            output: Some(OutputFormat::Json),
            ..ProbeCommand::default()
        };

        let report = cmd.run(&ctx).await.unwrap();
        let mut out = Vec::new();
        let err = cmd.finish(&ctx, &report, &mut out).unwrap_err();
        assert!(matches!(err, CliError::Storage(_)));

        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed["hosts"][0]["target"], "127.0.0.1");
        assert_eq!(printed["hosts"][0]["TCP1"], false);
    }

    #[test]
    fn test_flags_override_settings() {
        let ctx = Context {
            settings: AppSettings {
                tcp_timeout_ms: 100,
                concurrency: 2,
                ..AppSettings::default()
            },
            ..Context::default()
        };
        let cmd = ProbeCommand {
            timeout: Some(750),
            rate_limit: Some(5),
            ..ProbeCommand::default()
        };

        let config = cmd.engine_config(&ctx);
        assert_eq!(config.tcp_timeout, Duration::from_millis(750));
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.rate_limit, 5);
        assert_eq!(config.effective().udp_source_port, None);
    }

    #[test]
    fn test_output_format_fallback() {
        let mut ctx = Context::default();
        ctx.settings.default_output_format = "json".to_string();
        assert_eq!(ProbeCommand::default().output_format(&ctx), OutputFormat::Json);

        ctx.settings.default_output_format = "yaml".to_string();
        assert_eq!(ProbeCommand::default().output_format(&ctx), OutputFormat::Plain);
    }
}
