//! Session configuration
//!
//! Stored as JSON by whatever application embeds the client; a missing file
//! means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default transfer buffer size (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Client session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Buffer size used for uploads and downloads.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Minimum number of bytes between two progress callbacks (0 = every chunk).
    #[serde(default)]
    pub progress_interval: u64,
    /// Label used in log output.
    #[serde(default)]
    pub repository_id: Option<String>,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: 0,
            repository_id: None,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a JSON file, falling back to defaults if absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session config from {:?}", path))?;
        Self::from_json(&data)
    }

    /// Parse configuration from a JSON document.
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).context("Failed to parse session config JSON")
    }

    /// Builder: set the transfer buffer size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Builder: set the progress interval
    pub fn with_progress_interval(mut self, bytes: u64) -> Self {
        self.progress_interval = bytes;
        self
    }
}
