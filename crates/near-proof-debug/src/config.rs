//! Cost bounds applied while reconstructing chain history.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration parameters controlling how much chain history may be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Widest height interval `range_between` accepts
    pub max_range_width: u64,
    /// Largest subtree (in blocks) recomputed for a single level of a block path
    pub max_level_size: u64,
    /// Number of consecutive heights probed before giving up on finding a produced block
    pub max_height_probes: u64,
    /// Most blocks `rebuild_block_merkle_root` walks back through
    pub max_rebuild_blocks: u64,
    /// Recompute sibling subtrees from chain history; when off, only the root is compared
    pub recompute_levels: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            max_range_width: 16,
            max_level_size: 64,
            max_height_probes: 100,
            max_rebuild_blocks: 4096,
            recompute_levels: true,
        }
    }
}

impl DebugConfig {
    /// Load a JSON config; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
