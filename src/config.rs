//! Search service configuration.
//!
//! The API base endpoint is a process-wide value: it is resolved once at
//! startup (defaults, then `~/.rustpubsearch.json`, then environment) and
//! handed to the client and session read-only afterwards.

use crate::error::{PubSearchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

/// Default search service endpoint
pub const DEFAULT_API_BASE: &str = "http://0.0.0.0:8000";

/// Path of the structured (GET) search endpoint
pub const PAPERS_PATH: &str = "api/papers";

/// Path of the batch (multipart POST) search endpoint
pub const BATCH_PATH: &str = "api/search-csv";

/// The service stops returning rows at this count
pub const DEFAULT_RESULT_CAP: usize = 500;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment override for the API base
pub const ENV_API_BASE: &str = "PUBSEARCH_API_BASE";

/// Environment override for the request timeout
pub const ENV_TIMEOUT_SECS: &str = "PUBSEARCH_TIMEOUT_SECS";

/// Default config file path: `~/.rustpubsearch.json`
pub fn default_config_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".rustpubsearch.json"))
        .ok_or_else(|| PubSearchError::Config("Cannot determine home directory".to_string()))
}

/// Effective configuration for talking to the search service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the search service (scheme, host, port, optional prefix)
    pub api_base: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Row count at which the service truncates results
    pub result_cap: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            result_cap: DEFAULT_RESULT_CAP,
        }
    }
}

impl SearchConfig {
    /// Load configuration from file (if present) and environment.
    pub fn load() -> Result<Self> {
        let path = default_config_path()?;
        let config = Self::from_file(&path).with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Read a config file.
    ///
    /// Returns defaults if the file doesn't exist or is invalid
    pub fn from_file(path: &Path) -> Self {
        if !path.exists() {
            debug!("Config file not found: {:?}", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<SearchConfig>(&content) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Apply `PUBSEARCH_*` environment variables on top of `self`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_API_BASE).ok(),
            std::env::var(ENV_TIMEOUT_SECS)
                .ok()
                .and_then(|v| v.parse().ok()),
        )
    }

    /// Apply explicit overrides (CLI flags, env values); `None` keeps the current value
    pub fn with_overrides(mut self, api_base: Option<String>, timeout_secs: Option<u64>) -> Self {
        if let Some(base) = api_base {
            self.api_base = base;
        }
        if let Some(secs) = timeout_secs {
            self.timeout_secs = secs;
        }
        self
    }

    /// Check that the API base is an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_base).map_err(|e| {
            PubSearchError::Config(format!("Invalid API base '{}': {}", self.api_base, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PubSearchError::Config(format!(
                "API base must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(PubSearchError::Config("Timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Endpoint URL for structured searches
    pub fn papers_url(&self) -> Result<Url> {
        self.endpoint(PAPERS_PATH)
    }

    /// Endpoint URL for batch searches
    pub fn batch_url(&self) -> Result<Url> {
        self.endpoint(BATCH_PATH)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        // Trailing slash so `join` appends instead of replacing the last segment
        let base = format!("{}/", self.api_base.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|b| b.join(path))
            .map_err(|e| PubSearchError::Config(format!("Invalid API base '{}': {}", self.api_base, e)))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved config to {:?}", path);
        Ok(())
    }
}
