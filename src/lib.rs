//! # edgecheck - Edge Server Connectivity Diagnostics
//!
//! edgecheck verifies that a host can reach the edge servers of a telephony
//! deployment on the ports they serve.
//!
//! ## Features
//!
//! - **TCP Connect Probes**: Full handshake with an explicit timeout
//! - **UDP Binding Probe**: A fixed 100-byte STUN-style datagram to port 3478
//! - **Topology Discovery**: Edge servers from a topology document, per site or all
//! - **Ordered Reports**: One row per host, one `<PROTO><PORT>` column per port
//! - **Result Persistence**: CSV report per source host, overwritten each run
//! - **Multiple Output Formats**: Plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use edgecheck::probe::{run_probes, EngineConfig, NoopObserver, ProbeEngine, ProbeJob};
//! use edgecheck::types::{Host, PortList};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = EngineConfig::default();
//!     let engine = ProbeEngine::from_config(&config);
//!     let targets = vec![Host::parse("edge1.example.com").unwrap()];
//!     let job = ProbeJob::new(Host::local(), targets, PortList::default());
//!
//!     let report = run_probes(&job, &engine, &NoopObserver).await;
//!     println!("{}", report.summary());
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Hosts, ports and port specifications
//! - [`probe`] - TCP and UDP probes and the run orchestrator
//! - [`report`] - Per-host and per-run reports
//! - [`discovery`] - Target selection and topology documents
//! - [`storage`] - CSV report persistence
//! - [`config`] - Settings and XDG paths
//! - [`output`] - Console output and progress
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod output;
pub mod probe;
pub mod report;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ProbeError};
pub use probe::{run_probes, ProbeEngine, ProbeJob, ProbeResult, Prober};
pub use report::{HostReport, RunReport};
pub use types::{Host, Port, PortList, PortSpec, Protocol};
