//! Source-host trait for release listings, repository probes and asset downloads

#[cfg(test)]
use mockall::automock;

use crate::error::GitHubError;
use crate::github::types::ReleasePage;

/// Trait for reading releases and their assets from the source host
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches one page of releases, newest first
    ///
    /// # Arguments
    /// * `owner` - Repository owner (organization or user)
    /// * `repo` - Repository name
    /// * `after` - Cursor returned by the previous page, `None` for the first page
    async fn fetch_release_page(
        &self,
        owner: &str,
        repo: &str,
        after: Option<String>,
    ) -> Result<ReleasePage, GitHubError>;

    /// Returns whether the repository exists; a missing repository is `Ok(false)`
    async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool, GitHubError>;

    /// Downloads the full contents of a release asset
    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, GitHubError>;
}
