//! Indexer Configuration
//!
//! Read from the `[indexer]` table of a TOML file. Every key is optional.
//!
//! ```toml
//! [indexer]
//! suppress-whitespace = "both"
//! sparse-identifiers = 0
//! progress-step = 100
//! root-collection = "/db"
//! ```

use crate::core::text::WhitespaceMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid indexer configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables of the tree builder and ingester
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IndexerConfig {
    /// Whitespace normalization applied when text is flushed
    pub suppress_whitespace: WhitespaceMode,
    /// Slots reserved at every tree level for later insertions
    pub sparse_identifiers: u64,
    /// Progress notification granularity, in source lines
    pub progress_step: u32,
    /// Root marker prefixed to targets outside of it
    pub root_collection: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            suppress_whitespace: WhitespaceMode::Both,
            sparse_identifiers: 0,
            progress_step: 100,
            root_collection: "/db".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    indexer: IndexerConfig,
}

impl IndexerConfig {
    /// Parse the `[indexer]` table of a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(input)?;
        Ok(file.indexer)
    }

    /// Load the `[indexer]` table of a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Set the whitespace mode
    pub fn with_whitespace(mut self, mode: WhitespaceMode) -> Self {
        self.suppress_whitespace = mode;
        self
    }

    /// Set the per-level spacing
    pub fn with_sparse_identifiers(mut self, spacing: u64) -> Self {
        self.sparse_identifiers = spacing;
        self
    }

    /// Set the progress granularity
    pub fn with_progress_step(mut self, step: u32) -> Self {
        self.progress_step = step;
        self
    }
}
