use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

// =============================================================================
// Policy constants
// =============================================================================

/// Maximum age of a cached listing before a read triggers a background refresh (55 minutes)
pub const ALLOWED_AGE_MINUTES: i64 = 55;

/// Timeout for every upstream fetch in milliseconds (60 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 60_000;

/// Number of releases requested per page
pub const RELEASES_PAGE_SIZE: usize = 100;

/// Number of assets requested per release
pub const RELEASE_ASSETS_PAGE_SIZE: usize = 100;

/// Protocol versions assumed when a release ships no manifest
pub const DEFAULT_PROTOCOL_VERSIONS: &[&str] = &["5.0"];

const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const DEFAULT_REST_URL: &str = "https://api.github.com";

const APP_NAME: &str = "release-registry";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub github: GitHubConfig,
    pub cache: CacheConfig,
    pub keys: KeysConfig,
    /// Maps a requested provider namespace to the namespace that publishes its releases
    pub provider_namespace_redirects: HashMap<String, String>,
}

/// Upstream source host configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitHubConfig {
    pub graphql_url: String,
    pub rest_url: String,
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            rest_url: DEFAULT_REST_URL.to_string(),
            token: None,
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// SQLite database path; defaults to `<data dir>/listings.db`
    pub db_path: Option<PathBuf>,
}

/// Signing key directory configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct KeysConfig {
    /// Root of the `<namespace>/<key-id>.asc` tree; defaults to `<data dir>/keys`
    pub dir: Option<PathBuf>,
}

impl RegistryConfig {
    /// Loads configuration from an optional JSON file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                serde_json::from_str(&contents)?
            }
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from a variable lookup (normally the process environment).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
            self.github.token = Some(token);
        }
        if let Some(url) = lookup("GITHUB_GRAPHQL_URL") {
            self.github.graphql_url = url;
        }
        if let Some(url) = lookup("GITHUB_REST_URL") {
            self.github.rest_url = url;
        }
        if let Some(path) = lookup("RELEASE_REGISTRY_DB_PATH") {
            self.cache.db_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup("RELEASE_REGISTRY_KEYS_DIR") {
            self.keys.dir = Some(PathBuf::from(dir));
        }
        if let Some(redirects) = lookup("PROVIDER_NAMESPACE_REDIRECTS") {
            let parsed: HashMap<String, String> = serde_json::from_str(&redirects)
                .map_err(|e| ConfigError::InvalidRedirects(e.to_string()))?;
            self.provider_namespace_redirects.extend(parsed);
        }
        Ok(self)
    }

    pub fn db_path(&self) -> PathBuf {
        self.cache
            .db_path
            .clone()
            .unwrap_or_else(|| data_dir().join("listings.db"))
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.keys.dir.clone().unwrap_or_else(|| data_dir().join("keys"))
    }
}

/// Returns the path to the data directory for release-registry.
/// Uses $XDG_DATA_HOME/release-registry if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/release-registry,
/// or ./release-registry if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the directory log files are written to.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(APP_NAME)
}
