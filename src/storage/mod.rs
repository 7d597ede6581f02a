//! Run report persistence.
//!
//! Provides CSV-based storage of the latest run per source host.

mod csv_store;

pub use csv_store::{write_csv, ReportStore};
