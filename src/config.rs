use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::host::RepoRef;
use crate::host::github::DEFAULT_API_URL;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default pause between update passes in seconds (15 minutes)
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 15 * 60;

/// Timeout for hosting-platform HTTP requests in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Attempts per idempotent hosting-platform request
pub const API_MAX_RETRIES: u32 = 3;

/// Base delay between retry attempts in milliseconds; grows linearly
pub const API_RETRY_DELAY_MS: u64 = 1000;

// =============================================================================
// Other defaults
// =============================================================================

/// Default number of repositories resolved concurrently per pass
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Environment variable consulted when the config carries no token
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Top-level configuration, loaded from a TOML file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub update: UpdateConfig,
}

/// Which repositories to track and how to reach the hosting platform
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Repository URLs, e.g. `https://github.com/owner/repo`
    pub repositories: Vec<String>,
    /// Falls back to the `GITHUB_TOKEN` environment variable
    pub github_token: Option<String>,
    pub api_url: String,
    /// Parsed form of `repositories`, filled in by validation
    #[serde(skip)]
    pub repos: Vec<RepoRef>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            github_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            repos: Vec::new(),
        }
    }
}

/// HTTP serving configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Snapshot persistence configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: db_path(),
        }
    }
}

/// Update-pass cadence and fan-out
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpdateConfig {
    pub interval_secs: u64,
    pub concurrency: usize,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No repositories configured")]
    NoRepositories,

    #[error("Invalid repository URL: {0}")]
    InvalidRepository(String),

    #[error("No hosting-platform token configured; set github_token or {TOKEN_ENV}")]
    MissingToken,
}

impl Config {
    /// Loads and validates the configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        self.validate_with_env(std::env::var(TOKEN_ENV).ok())
    }

    fn validate_with_env(&mut self, env_token: Option<String>) -> Result<(), ConfigError> {
        if self.feed.repositories.is_empty() {
            return Err(ConfigError::NoRepositories);
        }

        self.feed.repos = self
            .feed
            .repositories
            .iter()
            .map(|url| {
                RepoRef::parse(url).ok_or_else(|| ConfigError::InvalidRepository(url.clone()))
            })
            .collect::<Result<_, _>>()?;

        if self.feed.github_token.as_deref().is_none_or(str::is_empty) {
            self.feed.github_token = env_token.filter(|token| !token.is_empty());
        }
        if self.feed.github_token.is_none() {
            return Err(ConfigError::MissingToken);
        }

        Ok(())
    }
}

/// Returns the path to the data directory for addon-feed.
/// Uses $XDG_DATA_HOME/addon-feed if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/addon-feed,
/// or ./addon-feed if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path to the snapshot database.
pub fn db_path() -> PathBuf {
    data_dir().join("catalog.db")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("addon-feed")
}
