//! Runtime configuration for weight-store.
//!
//! Configuration can be loaded from a JSON file or constructed
//! programmatically. Page sizing and the server knobs live here.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "weight-store", about = "Resident named-blob cache for model weights")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Store configuration.
    pub store: StoreConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    pub listen: String,

    /// Maximum accepted blob size in bytes (request body limit).
    pub max_blob_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            max_blob_bytes: 1024 * 1024 * 1024, // 1 GiB
        }
    }
}

/// Store sizing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Page (chunk) size in bytes.
    pub page_size: usize,

    /// Maximum live pages across all stored weights (0 = unbounded).
    pub max_pages: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: 4096,
            max_pages: 0,
        }
    }
}

impl StoreConfig {
    /// Number of pages a blob of `len` bytes occupies.
    pub fn pages_for(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Total bytes the page budget can hold (0 = unbounded).
    pub fn budget_bytes(&self) -> usize {
        self.max_pages * self.page_size
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file is missing.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let config: Config = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };

        anyhow::ensure!(config.store.page_size > 0, "store.page_size must be non-zero");
        Ok(config)
    }
}
