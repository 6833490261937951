//! Configuration loading and management
//!
//! Handles parsing of `.tasks.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::rewrite::RewriteStrategy;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = ".tasks.toml";

/// Default store file name
pub const DEFAULT_STORE_PATH: &str = "tasks.csv";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

/// Store-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the CSV file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// How the file is replaced after a mutation
    #[serde(default)]
    pub rewrite: RewriteStrategy,

    /// Bounded wait for the store lock; absent blocks until free
    #[serde(default)]
    pub lock_timeout_ms: Option<u64>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            rewrite: RewriteStrategy::default(),
            lock_timeout_ms: None,
        }
    }
}

impl StoreConfig {
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("store.path cannot be empty".to_string()));
        }
        if self.lock_timeout_ms == Some(0) {
            return Err(Error::InvalidConfig(
                "store.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.tasks.toml` file
    ///
    /// A relative `store.path` is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.validate()?;

        if config.store.path.is_relative() {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                config.store.path = dir.join(&config.store.path);
            }
        }
        Ok(config)
    }

    /// Load configuration if the file exists, or return defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        self.store.validate()
    }
}
