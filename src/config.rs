use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    CacheError, Result, CACHE_FILE, DEFAULT_API_BASE_URL,
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_CACHE_SIZE, DEFAULT_NAMESPACE,
};

/// Settings of a [`crate::ProfileManager`].
///
/// Stored as TOML; every field is optional in the file and falls back to
/// its default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Where the cache is persisted
    pub cache_file: PathBuf,
    /// Upper bound of cached profiles
    pub max_cache_size: usize,
    /// Root of the identity service
    pub api_base_url: String,
    /// Path segment of the name → profile endpoint
    pub namespace: String,
    pub connect_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from(CACHE_FILE),
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            namespace: DEFAULT_NAMESPACE.to_owned(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl CacheConfig {
    /// Loads the configuration from a TOML file. A missing file yields the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!(
                "no configuration at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: CacheConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_cache_size == 0 {
            return Err(CacheError::Config(
                "max_cache_size must be at least 1".to_owned(),
            ));
        }
        if self.namespace.trim().is_empty() {
            return Err(CacheError::Config(
                "namespace must not be empty".to_owned(),
            ));
        }
        if Url::parse(&self.api_base_url)?.cannot_be_a_base() {
            return Err(CacheError::Config(format!(
                "{} cannot be used as a base URL",
                self.api_base_url
            )));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
