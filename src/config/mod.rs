//! Configuration management for edgecheck.
//!
//! Provides XDG-compliant configuration storage and the settings that feed
//! the probe engine.

mod settings;

pub use settings::{AppSettings, Paths};
