use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid PROVIDER_NAMESPACE_REDIRECTS: {0}")]
    InvalidRedirects(String),
}

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Release not found: {0}")]
    ReleaseNotFound(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("No checksum listed for {0}")]
    ChecksumNotFound(String),

    #[error("Checksums or signature asset not found in release {0}")]
    ShaSumsNotFound(String),

    #[error("Invalid manifest: {0}")]
    ManifestInvalid(#[source] serde_json::Error),

    #[error("Upstream error: {0}")]
    Upstream(#[from] GitHubError),

    #[error("Could not get public keys: {0}")]
    KeysUnavailable(#[from] KeyError),
}

impl ProviderError {
    /// Whether the error means the requested version or platform does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ReleaseNotFound(_) | Self::AssetNotFound(_) | Self::ChecksumNotFound(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Failed to read key directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not an ASCII-armored public key: {0:?}")]
    InvalidKey(PathBuf),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Failed to create cache directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Invalid refresh request: {0}")]
    InvalidRequest(String),

    #[error("Repository {0} does not exist")]
    RepositoryNotFound(String),

    #[error("No versions found for {0}")]
    NoVersions(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] GitHubError),

    #[error("Failed to aggregate versions: {0}")]
    Provider(#[from] ProviderError),

    #[error("Failed to store versions: {0}")]
    Cache(#[from] CacheError),

    #[error("No async runtime available to run the refresh")]
    NoRuntime,

    #[error("Refresh task set lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] GitHubError),

    #[error("Failed to resolve provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("Could not get public keys: {0}")]
    Keys(#[from] KeyError),
}
