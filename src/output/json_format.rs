//! JSON output formatting.

use crate::report::RunReport;
use std::io::{self, Write};

/// Write results in JSON format.
pub fn write_json<W: Write>(report: &RunReport, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).map_err(io::Error::other)?;
    writeln!(out)
}
