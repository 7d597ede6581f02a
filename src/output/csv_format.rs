//! CSV output formatting.

use crate::report::RunReport;
use crate::storage::write_csv;
use std::io::{self, Write};

/// Write results in CSV format, with the same layout as the saved report.
pub fn write_csv_report<W: Write>(report: &RunReport, out: &mut W) -> io::Result<()> {
    write_csv(report, out).map_err(io::Error::other)
}
