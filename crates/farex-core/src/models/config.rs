//! Configuration for the acquisition-and-extraction pipeline.
//!
//! The config is built by the caller and handed to the pipeline; no module
//! reads ambient globals.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the farex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FarexConfig {
    /// Download manager configuration.
    pub download: DownloadConfig,

    /// Storage layout configuration.
    pub storage: StorageConfig,

    /// Extraction engine configuration.
    pub extraction: ExtractionConfig,
}

/// Download manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Maximum number of in-flight fetches.
    pub concurrency: usize,

    /// Attempt budget per document, including the first try; 1 disables
    /// retry (backfill mode).
    pub attempts: u32,

    /// Base delay for exponential backoff, in milliseconds.
    pub backoff_base_ms: u64,

    /// Cap on a single backoff delay, in milliseconds.
    pub backoff_max_ms: u64,

    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,

    /// User-Agent header sent with every fetch.
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            attempts: 3,
            backoff_base_ms: 250,
            backoff_max_ms: 10_000,
            timeout_secs: 60,
            user_agent: "farex/0.1.0".to_string(),
        }
    }
}

/// Where fetched documents and the store snapshot live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for fetched documents.
    pub media_root: PathBuf,

    /// Path of the store snapshot file.
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            state_path: PathBuf::from("farex.json"),
        }
    }
}

/// Extraction engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Markers that veto extraction, matched case-insensitively against
    /// every line.
    pub excluded_markers: Vec<String>,

    /// Markers that classify a document as an aggregator invoice.
    pub aggregator_markers: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            excluded_markers: crate::extract::EXCLUDED_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
            aggregator_markers: crate::extract::AGGREGATOR_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }
}

impl FarexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
