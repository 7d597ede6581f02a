//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and report data.

use crate::error::{ConfigError, ConfigResult};
use crate::probe::{EngineConfig, DEFAULT_SOURCE_PORT};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Global paths singleton.
static PATHS: OnceLock<Paths> = OnceLock::new();

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/edgecheck)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/edgecheck)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance, creating the directories on first use.
    pub fn get() -> ConfigResult<&'static Paths> {
        if let Some(paths) = PATHS.get() {
            return Ok(paths);
        }
        let paths = Self::new()?;
        Ok(PATHS.get_or_init(|| paths))
    }

    fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "edgecheck", "edgecheck")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Self::under(project.config_dir(), project.data_dir())
    }

    /// Paths rooted at explicit directories.
    pub fn under(config_dir: &Path, data_dir: &Path) -> ConfigResult<Self> {
        let paths = Self {
            config_dir: config_dir.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
        };

        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the path to the default topology document.
    pub fn topology_file(&self) -> PathBuf {
        self.config_dir.join("topology.json")
    }

    /// Get the directory reports are written to.
    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// TCP connect timeout in milliseconds.
    pub tcp_timeout_ms: u64,
    /// Wait for a UDP reply in milliseconds.
    pub udp_timeout_ms: u64,
    /// Local port UDP probes are sent from; 0 for ephemeral.
    pub udp_source_port: u16,
    /// Number of hosts probed at the same time.
    pub concurrency: usize,
    /// Maximum probe starts per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Default output format.
    pub default_output_format: String,
    /// Write the CSV report after each run.
    pub auto_save_reports: bool,
    /// Topology document used when no target list is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology_file: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            tcp_timeout_ms: 3000,
            udp_timeout_ms: 1000,
            udp_source_port: DEFAULT_SOURCE_PORT,
            concurrency: 1,
            rate_limit: 0,
            default_output_format: "plain".to_string(),
            auto_save_reports: true,
            topology_file: None,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults
    /// when no settings file exists.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::get()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Probe engine settings described by this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_tcp_timeout(Duration::from_millis(self.tcp_timeout_ms))
            .with_udp_timeout(Duration::from_millis(self.udp_timeout_ms))
            .with_udp_source_port(Some(self.udp_source_port).filter(|&p| p != 0))
            .with_concurrency(self.concurrency)
            .with_rate_limit(self.rate_limit)
    }
}
