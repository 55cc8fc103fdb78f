//! # Configuration Management Module
//!
//! Centralized, serde-backed configuration for the vault engine and its
//! command line front end. Every section has defaults, so a partial TOML file
//! (or none at all) yields a working configuration.
//!
//! ## Configuration Structure
//!
//! - [`StorageConfig`] - sled database location and chunked write tuning
//! - [`ArchiveConfig`] - import batch size and archive size ceiling
//! - [`BlobConfig`] - where materialized blob handles are written
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use campaign_vault::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("vault.toml").await?;
//!     println!("Database: {}", config.storage.db_path);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [storage]
//! db_path = "./data/vault"
//! write_chunk_size = 8
//! chunk_pause_ms = 0
//!
//! [archive]
//! import_batch_size = 5
//! max_extract_bytes = 524288000
//!
//! [logging]
//! level = "info"
//! file = "campaign-vault.log"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::assets::batch::DEFAULT_WRITE_CHUNK_SIZE;
use crate::assets::import::{DEFAULT_IMPORT_BATCH_SIZE, DEFAULT_MAX_EXTRACT_BYTES};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: String,
    /// Records per write transaction during bulk replacement.
    #[serde(default = "default_write_chunk_size")]
    pub write_chunk_size: usize,
    /// Sleep between write chunks (ms). Zero only yields.
    #[serde(default)]
    pub chunk_pause_ms: u64,
}

fn default_write_chunk_size() -> usize {
    DEFAULT_WRITE_CHUNK_SIZE
}

impl StorageConfig {
    pub fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "./data/vault".to_string(),
            write_chunk_size: DEFAULT_WRITE_CHUNK_SIZE,
            chunk_pause_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Entries decoded concurrently per import batch.
    #[serde(default = "default_import_batch_size")]
    pub import_batch_size: usize,
    /// Ceiling on the total uncompressed size of an imported archive.
    #[serde(default = "default_max_extract_bytes")]
    pub max_extract_bytes: u64,
}

fn default_import_batch_size() -> usize {
    DEFAULT_IMPORT_BATCH_SIZE
}

fn default_max_extract_bytes() -> u64 {
    DEFAULT_MAX_EXTRACT_BYTES
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            import_batch_size: DEFAULT_IMPORT_BATCH_SIZE,
            max_extract_bytes: DEFAULT_MAX_EXTRACT_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlobConfig {
    /// Directory for materialized blob files; defaults to the system temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("campaign-vault.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Parse `level`, falling back to Info for unknown values.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub blobs: BlobConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}
