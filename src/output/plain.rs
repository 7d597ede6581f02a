//! Plain text output formatting.
//!
//! Produces a human-readable reachability table with colors.

use crate::report::RunReport;
use crate::types::{Host, PortList};
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Write the reachability table: one row per target, one column per label.
pub fn write_plain<W: Write>(report: &RunReport, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(
        out,
        "                {} Connectivity Results",
        style("edgecheck").cyan().bold()
    )?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(out, "  {} {}", style("Source:").bold(), report.source)?;
    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "  {} {}", style("Summary:").bold(), report.summary())?;
    writeln!(out)?;

    if report.is_empty() {
        writeln!(out, "  {}", style("No hosts to display.").dim())?;
    } else {
        let labels = report.labels();
        let target_width = report
            .hosts
            .iter()
            .map(|h| h.target.as_str().len())
            .max()
            .unwrap_or(0)
            .max("TARGET".len());

        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        write!(out, "  {:<width$}", style("TARGET").bold(), width = target_width)?;
        for label in &labels {
            write!(out, "  {:^8}", style(label).bold())?;
        }
        writeln!(out)?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        let ok = Style::new().green().bold();
        let failed = Style::new().red();

        for host in &report.hosts {
            let target_style = if host.all_reachable() {
                Style::new()
            } else {
                Style::new().yellow()
            };
            write!(
                out,
                "  {:<width$}",
                target_style.apply_to(host.target.as_str()),
                width = target_width
            )?;
            for label in &labels {
                let cell = match host.get(label) {
                    Some(true) => ok.apply_to("✓"),
                    Some(false) => failed.apply_to("✗"),
                    None => Style::new().dim().apply_to("-"),
                };
                write!(out, "  {:^8}", cell)?;
            }
            writeln!(out)?;
        }

        writeln!(out, "  {}", style(THIN_RULE).dim())?;
    }

    let unreachable: Vec<&str> = report.unreachable_hosts().map(Host::as_str).collect();
    if !unreachable.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "  {} {}",
            style("Unreachable:").red().bold(),
            unreachable.join(", ")
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Print a run header before probing begins.
pub fn print_run_header(source: &Host, hosts: usize, ports: &PortList) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("edgecheck").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Source: {}", style("•").dim(), style(source).white().bold());
    println!(
        "{} Probing {} hosts on {}",
        style("•").dim(),
        style(hosts).white().bold(),
        style(ports).yellow()
    );
    println!();
}

/// Print one host per line.
pub fn print_hosts(hosts: &[Host]) {
    for host in hosts {
        println!("{}", host);
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
