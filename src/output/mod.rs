//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of run reports,
//! and the console progress observer used while a run is in flight.

mod csv_format;
mod json_format;
mod plain;
mod progress;

pub use csv_format::write_csv_report;
pub use json_format::write_json;
pub use plain::{print_error, print_hosts, print_info, print_run_header, write_plain};
pub use progress::{outcome_line, ConsoleProgress};

use crate::cli::OutputFormat;
use crate::report::RunReport;
use std::io::{self, Write};

/// Format a run report according to the specified format.
pub fn write_results<W: Write>(report: &RunReport, format: OutputFormat, out: &mut W) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::write_plain(report, out),
        OutputFormat::Json => json_format::write_json(report, out),
        OutputFormat::Csv => csv_format::write_csv_report(report, out),
    }
}
