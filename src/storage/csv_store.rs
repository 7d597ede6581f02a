//! CSV report persistence.
//!
//! Each source host has one report file that every run overwrites, so the
//! file always describes the most recent run from that host.

use crate::config::Paths;
use crate::error::{StorageError, StorageResult};
use crate::report::RunReport;
use crate::types::Host;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes run reports as CSV files into one directory.
#[derive(Debug, Clone)]
pub struct ReportStore {
    reports_dir: PathBuf,
}

impl ReportStore {
    /// Create a store writing into `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let reports_dir = dir.into();
        fs::create_dir_all(&reports_dir)
            .map_err(|e| StorageError::DirectoryError(format!("{}: {}", reports_dir.display(), e)))?;

        Ok(Self { reports_dir })
    }

    /// Store writing into the XDG data directory.
    pub fn default_location() -> StorageResult<Self> {
        Self::new(Paths::get()?.reports_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.reports_dir
    }

    /// File the report for `source` is written to.
    pub fn report_path(&self, source: &Host) -> PathBuf {
        self.reports_dir
            .join(format!("{}-edge-connectivity.csv", source))
    }

    /// Write the report, replacing the previous one for the same source host.
    pub fn save(&self, report: &RunReport) -> StorageResult<PathBuf> {
        let path = self.report_path(&report.source);
        let file = fs::File::create(&path)
            .map_err(|e| StorageError::SaveFailed(format!("{}: {}", path.display(), e)))?;

        write_csv(report, file)?;
        tracing::debug!(path = %path.display(), hosts = report.len(), "report saved");
        Ok(path)
    }
}

/// Write a report as CSV: `source,target,<label>...`, one row per host.
pub fn write_csv<W: io::Write>(report: &RunReport, writer: W) -> StorageResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let labels = report.labels();
    let mut header = vec!["source".to_string(), "target".to_string()];
    header.extend(labels.iter().cloned());
    wtr.write_record(&header)?;

    for host in &report.hosts {
        let mut row = vec![host.source.to_string(), host.target.to_string()];
        row.extend(labels.iter().map(|label| match host.get(label) {
            Some(true) => "True".to_string(),
            Some(false) => "False".to_string(),
            None => String::new(),
        }));
        wtr.write_record(&row)?;
    }

    wtr.flush()
        .map_err(|e| StorageError::SaveFailed(e.to_string()))?;
    Ok(())
}
