//! Configuration for CaskKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CaskError, Result};
use crate::record::HEADER_SIZE;

/// Main configuration for a CaskKV instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the segment files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── 0000000001.data   (sealed)
    ///     ├── 0000000002.data   (sealed)
    ///     └── 0000000003.data   (active)
    pub data_dir: PathBuf,

    /// Create `data_dir` on open when it does not exist
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // Segment Configuration
    // -------------------------------------------------------------------------
    /// Size budget of a segment (in bytes) before rollover
    pub max_segment_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./caskkv_data"),
            create_if_missing: true,
            max_segment_size: 64 * 1024 * 1024, // 64 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with
    ///
    /// A segment budget at or below the record header size would force a
    /// rollover before every single write.
    pub fn validate(&self) -> Result<()> {
        if self.max_segment_size <= HEADER_SIZE as u64 {
            return Err(CaskError::Config(format!(
                "max_segment_size must be greater than {} bytes, got {}",
                HEADER_SIZE, self.max_segment_size
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set whether a missing data directory is created on open
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the maximum segment size (in bytes)
    pub fn max_segment_size(mut self, size: u64) -> Self {
        self.config.max_segment_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
