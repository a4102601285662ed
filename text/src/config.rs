//! Buffer tuning knobs, loadable from TOML.
//!
//! Hosts usually keep these in a `[buffer]` table of their own settings file and hand the
//! table's text to [`BufferConfig::from_toml`], or point [`BufferConfig::load`] at a
//! standalone file. Every key is optional.
//!
//! ```toml
//! chunk_size = 65536
//! boundary_window = 64
//! word_separators = "./\\()\"'-:,.;<>~!@#$%^&*|+=[]{}`~?"
//! word_whitespace = " \n\t\r"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Default storage growth chunk, in code points.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Default first window of the line boundary scan, in code points.
pub const DEFAULT_BOUNDARY_WINDOW: usize = 32;

pub const DEFAULT_WORD_SEPARATORS: &str = "./\\()\"'-:,.;<>~!@#$%^&*|+=[]{}`~?";
pub const DEFAULT_WORD_WHITESPACE: &str = " \n\t\r";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chunk_size must be a non-zero power of two, got {0}")]
    ChunkSize(usize),

    #[error("boundary_window must be greater than zero")]
    BoundaryWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferConfig {
    /// Storage grows its capacity in multiples of this many code points.
    ///
    /// Large values make reallocation rare for documents built up by small inserts.
    pub chunk_size: usize,

    /// Size of the first window fetched while scanning for a line terminator.
    ///
    /// The window doubles each time a scan comes back without finding one.
    pub boundary_window: usize,

    /// Punctuation that separates words.
    pub word_separators: String,

    /// Whitespace that separates words.
    pub word_whitespace: String,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            boundary_window: DEFAULT_BOUNDARY_WINDOW,
            word_separators: DEFAULT_WORD_SEPARATORS.to_string(),
            word_whitespace: DEFAULT_WORD_WHITESPACE.to_string(),
        }
    }
}

impl BufferConfig {
    /// Read, deserialize and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Deserialize and validate a TOML document.
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: BufferConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.chunk_size.is_power_of_two() {
            return Err(ConfigError::ChunkSize(self.chunk_size));
        }
        if self.boundary_window == 0 {
            return Err(ConfigError::BoundaryWindow);
        }
        Ok(())
    }

    /// Whether `ch` ends a word: any separator or whitespace code point.
    pub fn is_word_boundary(&self, ch: char) -> bool {
        self.word_separators.contains(ch) || self.word_whitespace.contains(ch)
    }

    pub fn is_whitespace(&self, ch: char) -> bool {
        self.word_whitespace.contains(ch)
    }
}
