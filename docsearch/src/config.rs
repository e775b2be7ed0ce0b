//! Search configuration via `docsearch.toml`
//!
//! Every key is optional; missing keys take their defaults. After the file is
//! read, a few environment variables override it so a deployment can relocate
//! or switch off search without editing the file.

use crate::highlight::DEFAULT_CONTEXT_CHARS;
use crate::indexer::MIN_WRITER_HEAP_BYTES;
use crate::query::{DEFAULT_LIMIT, DEFAULT_OVERFETCH, MAX_LIMIT};
use crate::tokenizer::Segmentation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up by the CLI.
pub const CONFIG_FILE_NAME: &str = "docsearch.toml";

pub const ENV_INDEX_DIR: &str = "DOCSEARCH_INDEX_DIR";
pub const ENV_OUTBOX_PATH: &str = "DOCSEARCH_OUTBOX_PATH";
pub const ENV_DISABLED: &str = "DOCSEARCH_DISABLED";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to write config file: {0}")]
    Write(#[from] std::io::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loaded from `docsearch.toml`.
///
/// # Example
///
/// ```toml
/// index_dir = "/var/lib/archive/search_index"
/// segmentation = "script"
/// overfetch = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub index_dir: PathBuf,
    pub outbox_path: PathBuf,
    pub writer_heap_bytes: usize,
    /// Extra ranked candidates fetched beyond `skip + limit`
    pub overfetch: usize,
    pub default_limit: usize,
    pub max_limit: usize,
    /// Highlight context on each side of the match, in chars
    pub context_chars: usize,
    pub segmentation: Segmentation,
    /// `false` starts the service with the unavailable backend
    pub search_enabled: bool,
    /// Default tracing filter for the CLI; `RUST_LOG` wins when set
    pub log_level: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./search_index"),
            outbox_path: PathBuf::from("./search_outbox.sqlite"),
            writer_heap_bytes: 50_000_000,
            overfetch: DEFAULT_OVERFETCH,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            context_chars: DEFAULT_CONTEXT_CHARS,
            segmentation: Segmentation::Script,
            search_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl SearchConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# docsearch configuration
#
# Directory holding the full-text index. Created on first use.
index_dir = "./search_index"

# SQLite database holding pending reindex events.
outbox_path = "./search_outbox.sqlite"

# Memory budget of the index writer, in bytes (minimum 15000000).
writer_heap_bytes = 50000000

# Ranked candidates fetched beyond skip + limit before filters are applied.
# Totals are exact only while all matches fit in this window.
overfetch = 100

# Page size used when the caller gives none, and its upper bound (at most 100).
default_limit = 20
max_limit = 100

# Characters of context on each side of a highlighted match.
context_chars = 100

# "script"     = words plus unigram/bigram segmentation of CJK text
# "whitespace" = plain whitespace splitting
# An existing index keeps the segmentation it was built with.
segmentation = "script"

# Set to false to run without search: writes are dropped, queries fail
# with "search unavailable".
search_enabled = true

# Default log filter for the command line tool (RUST_LOG overrides).
log_level = "info"
"#
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SearchConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Config from `path` when it exists, defaults otherwise, then
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::debug!(target: "docsearch::config", path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_INDEX_DIR).filter(|v| !v.is_empty()) {
            self.index_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(ENV_OUTBOX_PATH).filter(|v| !v.is_empty()) {
            self.outbox_path = PathBuf::from(path);
        }
        if let Some(flag) = lookup(ENV_DISABLED) {
            if matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on") {
                self.search_enabled = false;
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_limit == 0 || self.max_limit > MAX_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_limit must be between 1 and {}, got {}",
                MAX_LIMIT, self.max_limit
            )));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit must be between 1 and max_limit ({}), got {}",
                self.max_limit, self.default_limit
            )));
        }
        if self.writer_heap_bytes < MIN_WRITER_HEAP_BYTES {
            return Err(ConfigError::Invalid(format!(
                "writer_heap_bytes must be at least {}, got {}",
                MIN_WRITER_HEAP_BYTES, self.writer_heap_bytes
            )));
        }
        Ok(())
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `true` when a file was created.
    pub fn write_default_if_missing(path: &Path) -> ConfigResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml())?;
        Ok(true)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
