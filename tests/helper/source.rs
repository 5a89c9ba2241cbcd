//! In-memory release source for testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use release_registry::error::GitHubError;
use release_registry::github::{Release, ReleaseAsset, ReleasePage, ReleaseSource};

/// Serves releases and asset bodies from memory, `page_size` releases per page
pub struct FakeReleaseSource {
    repos: HashMap<String, Vec<Release>>,
    assets: HashMap<String, Vec<u8>>,
    page_size: usize,
    page_requests: AtomicUsize,
}

impl FakeReleaseSource {
    pub fn new() -> Self {
        Self {
            repos: HashMap::new(),
            assets: HashMap::new(),
            page_size: 100,
            page_requests: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_repo(mut self, owner: &str, repo: &str, releases: Vec<Release>) -> Self {
        self.repos.insert(format!("{}/{}", owner, repo), releases);
        self
    }

    pub fn with_asset(mut self, url: &str, body: &str) -> Self {
        self.assets.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    /// Number of release pages served so far
    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseSource for FakeReleaseSource {
    async fn fetch_release_page(
        &self,
        owner: &str,
        repo: &str,
        after: Option<String>,
    ) -> Result<ReleasePage, GitHubError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        let key = format!("{}/{}", owner, repo);
        let releases = self
            .repos
            .get(&key)
            .ok_or(GitHubError::RepositoryNotFound(key))?;

        let start: usize = after.map(|c| c.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(releases.len());
        Ok(ReleasePage {
            releases: releases[start..end].to_vec(),
            end_cursor: (end < releases.len()).then(|| end.to_string()),
        })
    }

    async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool, GitHubError> {
        Ok(self.repos.contains_key(&format!("{}/{}", owner, repo)))
    }

    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, GitHubError> {
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| GitHubError::UnexpectedStatus {
                status: 404,
                url: url.to_string(),
            })
    }
}

pub fn asset_url(name: &str) -> String {
    format!("https://downloads.example.com/{}", name)
}

pub fn release(tag: &str, asset_names: &[String]) -> Release {
    Release {
        id: format!("R_{}", tag),
        tag_name: tag.to_string(),
        is_draft: false,
        is_prerelease: false,
        is_latest: false,
        assets: asset_names
            .iter()
            .map(|name| ReleaseAsset {
                id: format!("A_{}", name),
                name: name.clone(),
                download_url: asset_url(name),
            })
            .collect(),
        tarball_url: None,
    }
}

/// A provider release with one binary per platform, checksums and signature
pub fn provider_release(prefix: &str, version: &str, platforms: &[(&str, &str)]) -> Release {
    let mut names: Vec<String> = platforms
        .iter()
        .map(|(os, arch)| format!("{}_{}_{}_{}.zip", prefix, version, os, arch))
        .collect();
    names.push(format!("{}_{}_SHA256SUMS", prefix, version));
    names.push(format!("{}_{}_SHA256SUMS.sig", prefix, version));
    release(&format!("v{}", version), &names)
}

/// SHA256SUMS body listing a digest for each platform binary
pub fn shasums_body(prefix: &str, version: &str, platforms: &[(&str, &str)]) -> String {
    platforms
        .iter()
        .map(|(os, arch)| {
            format!(
                "{}{}  {}_{}_{}_{}.zip\n",
                os, arch, prefix, version, os, arch
            )
        })
        .collect()
}
