//! Service configuration for memos-import
//!
//! Each setting resolves with priority: command-line flag → environment
//! variable → TOML file → built-in default. Flags and environment variables
//! arrive together through clap as [`CliOverrides`].

use memos_common::config::{default_temp_dir, load_toml_config, LoggingConfig};
use memos_common::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::StagingLimits;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3131;

/// Upload staging settings (`[uploads]`)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UploadSettings {
    pub max_file_bytes: u64,
    pub max_total_bytes: u64,
    pub max_files: usize,
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        let limits = StagingLimits::default();
        Self {
            max_file_bytes: limits.max_file_bytes,
            max_total_bytes: limits.max_total_bytes,
            max_files: limits.max_files,
            ttl_secs: limits.ttl.as_secs(),
            sweep_interval_secs: 5 * 60,
        }
    }
}

/// Remote client settings (`[client]`)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientSettings {
    /// Pause after each created note, in milliseconds
    pub send_delay_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            send_delay_ms: 1000,
        }
    }
}

/// On-disk TOML layout; every key optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upload_root: Option<PathBuf>,
    pub artifact_dir: Option<PathBuf>,
    pub web_root: Option<PathBuf>,
    pub uploads: UploadSettings,
    pub client: ClientSettings,
    pub logging: LoggingConfig,
}

/// Values supplied by command-line flags or their environment variables
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upload_root: Option<PathBuf>,
    pub artifact_dir: Option<PathBuf>,
    pub web_root: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Parent directory of staged uploads
    pub upload_root: PathBuf,
    /// Directory receiving `sendedIds.json` / `memo.json`
    pub artifact_dir: PathBuf,
    /// Static UI directory, served for unmatched GETs when set
    pub web_root: Option<PathBuf>,
    pub uploads: UploadSettings,
    pub client: ClientSettings,
    pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::resolve(CliOverrides::default(), FileConfig::default())
    }
}

impl ServiceConfig {
    /// Merge overrides onto file values and defaults
    pub fn resolve(cli: CliOverrides, file: FileConfig) -> Self {
        Self {
            host: cli
                .host
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            upload_root: cli
                .upload_root
                .or(file.upload_root)
                .unwrap_or_else(|| default_temp_dir("memos-import-upload")),
            artifact_dir: cli
                .artifact_dir
                .or(file.artifact_dir)
                .unwrap_or_else(|| default_temp_dir("memos-import-artifacts")),
            web_root: cli.web_root.or(file.web_root),
            uploads: file.uploads,
            client: file.client,
            logging: file.logging,
        }
    }

    /// Load the TOML file (if any) and merge the overrides onto it
    pub fn load(cli: CliOverrides, config_path: Option<&Path>) -> Result<Self> {
        let file: FileConfig = load_toml_config(config_path)?;
        Ok(Self::resolve(cli, file))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn staging_limits(&self) -> StagingLimits {
        StagingLimits {
            max_file_bytes: self.uploads.max_file_bytes,
            max_total_bytes: self.uploads.max_total_bytes,
            max_files: self.uploads.max_files,
            ttl: Duration::from_secs(self.uploads.ttl_secs),
        }
    }

    /// Sweep period, never below one second
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.uploads.sweep_interval_secs.max(1))
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.client.send_delay_ms)
    }
}
