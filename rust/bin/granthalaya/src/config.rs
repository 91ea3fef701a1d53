//! Server configuration file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/granthalaya"
//!
//! [server]
//! listen = "127.0.0.1:8080"
//! blob_base_url = "https://files.example.org/blobs"
//!
//! [scanner]
//! burst_gap_ms = 100
//! min_scan_len = 3
//! ```
//!
//! Every section and key is optional. Command-line flags win over the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use granthalaya_core::ServiceConfig;
use granthalaya_inventory::code::ScannerConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub data_dir: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub blob_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub listen: Option<String>,
    pub blob_base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub storage: StorageSection,
    pub server: ServerSection,
    pub scanner: ScannerConfig,
}

/// Values given on the command line, applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub listen: Option<String>,
}

impl FileConfig {
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path`, or all defaults when no file was given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn service_config(&self, overrides: &Overrides) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        ServiceConfig {
            data_dir: overrides.data_dir.clone().or_else(|| self.storage.data_dir.clone()),
            db_path: self.storage.db_path.clone(),
            blob_dir: self.storage.blob_dir.clone(),
            blob_base_url: self.server.blob_base_url.clone(),
            listen: overrides
                .listen
                .clone()
                .or_else(|| self.server.listen.clone())
                .unwrap_or(defaults.listen),
        }
    }
}
