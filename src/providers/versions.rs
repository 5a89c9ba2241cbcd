//! Version aggregation across all releases of a provider repository

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::ProviderError;
use crate::github::harvester::{fetch_releases, find_release};
use crate::github::source::ReleaseSource;
use crate::github::types::find_asset_by_suffix;
use crate::platform::Platform;
use crate::providers::artifacts::{ShaSumsUrls, assemble_platform, resolve_release};
use crate::providers::manifest::{find_and_parse_manifest, protocols_or_default};
use crate::providers::shasums::{SHASUMS_SIGNATURE_SUFFIX, SHASUMS_SUFFIX, download_shasums};
use crate::providers::types::{VersionDetails, VersionRecord, dedup_versions};

/// Harvests every release of `owner/repo` and resolves them concurrently.
///
/// A release that fails to resolve is logged and left out; only a harvest
/// failure fails the call. Output order is not release order. Dropping the
/// returned future cancels the resolutions still running.
pub async fn get_versions(
    source: Arc<dyn ReleaseSource>,
    owner: &str,
    repo: &str,
) -> Result<Vec<VersionRecord>, ProviderError> {
    let releases = fetch_releases(source.as_ref(), owner, repo).await?;
    let release_count = releases.len();

    // Dropping the set aborts every resolution still in flight.
    let mut tasks = JoinSet::new();
    for release in releases {
        let source = Arc::clone(&source);
        tasks.spawn(async move {
            let result = resolve_release(source.as_ref(), &release).await;
            (release.tag_name, result)
        });
    }

    let mut records = Vec::with_capacity(release_count);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(Some(record)))) => records.push(record),
            Ok((tag, Ok(None))) => {
                debug!("Skipping release {} of {}/{}: no platforms", tag, owner, repo)
            }
            Ok((tag, Err(e))) => {
                error!("Failed to resolve release {} of {}/{}: {}", tag, owner, repo, e)
            }
            Err(e) => error!("Release resolution task for {}/{} failed: {}", owner, repo, e),
        }
    }

    let records = dedup_versions(records);
    info!(
        "Resolved {} of {} releases for {}/{}",
        records.len(),
        release_count,
        owner,
        repo
    );
    Ok(records)
}

/// Resolves download details of a single version directly from upstream.
///
/// The returned details carry no signing keys; callers attach them.
pub async fn get_version(
    source: &dyn ReleaseSource,
    owner: &str,
    repo: &str,
    version: &str,
    os: &str,
    arch: &str,
) -> Result<VersionDetails, ProviderError> {
    let release = find_release(source, owner, repo, version)
        .await?
        .ok_or_else(|| ProviderError::ReleaseNotFound(format!("{}/{} v{}", owner, repo, version)))?;

    let platform = Platform::new(os, arch);
    let binary = find_asset_by_suffix(&release.assets, &platform.archive_suffix())
        .ok_or_else(|| ProviderError::AssetNotFound(format!("{} {}", release.tag_name, platform)))?;

    let shasums_asset = find_asset_by_suffix(&release.assets, SHASUMS_SUFFIX);
    let signature_asset = find_asset_by_suffix(&release.assets, SHASUMS_SIGNATURE_SUFFIX);
    let (Some(shasums_asset), Some(signature_asset)) = (shasums_asset, signature_asset) else {
        return Err(ProviderError::ShaSumsNotFound(release.tag_name.clone()));
    };

    let manifest = find_and_parse_manifest(source, &release.assets).await?;
    let shasums = download_shasums(source, shasums_asset).await?;
    let urls = ShaSumsUrls {
        shasums_url: shasums_asset.download_url.clone(),
        signature_url: signature_asset.download_url.clone(),
    };

    let details = assemble_platform(&platform, &release.assets, &shasums, &urls)
        .ok_or_else(|| ProviderError::ChecksumNotFound(binary.name.clone()))?;

    let record = VersionRecord {
        version: release.version().to_string(),
        protocols: protocols_or_default(manifest),
        download_details: vec![details],
    };
    record
        .version_details(os, arch)
        .ok_or_else(|| ProviderError::AssetNotFound(format!("{} {}", release.tag_name, platform)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitHubError;
    use crate::github::source::MockReleaseSource;
    use crate::github::types::{Release, ReleaseAsset, ReleasePage};

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            id: name.to_string(),
            name: name.to_string(),
            download_url: format!("https://dl.example.com/{}", name),
        }
    }

    fn release(tag: &str, names: &[String]) -> Release {
        Release {
            id: tag.to_string(),
            tag_name: tag.to_string(),
            is_draft: false,
            is_prerelease: false,
            is_latest: false,
            assets: names.iter().map(|name| asset(name)).collect(),
            tarball_url: None,
        }
    }

    fn standard_release(version: &str) -> Release {
        release(
            &format!("v{}", version),
            &[
                format!("pkg_{}_linux_amd64.zip", version),
                format!("pkg_{}_SHA256SUMS", version),
                format!("pkg_{}_SHA256SUMS.sig", version),
            ],
        )
    }

    /// Serves SHA256SUMS listing the linux_amd64 binary for any version,
    /// and fails every manifest download.
    fn serve_sums(source: &mut MockReleaseSource) {
        source.expect_download_asset().returning(|url| {
            let name = url.rsplit('/').next().unwrap_or_default();
            match name.strip_suffix("_SHA256SUMS") {
                Some(prefix) => Ok(format!("abc123  {}_linux_amd64.zip\n", prefix).into_bytes()),
                None if name.ends_with("_manifest.json") => Ok(b"{broken".to_vec()),
                None => Err(GitHubError::UnexpectedStatus {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        });
    }

    #[tokio::test]
    async fn get_versions_skips_failed_and_empty_releases() {
        let broken = release(
            "v0.9.0",
            &[
                "pkg_0.9.0_linux_amd64.zip".to_string(),
                "pkg_0.9.0_SHA256SUMS".to_string(),
                "pkg_0.9.0_manifest.json".to_string(),
            ],
        );
        let docs_only = release("v0.8.0", &["README.md".to_string()]);
        let releases = vec![
            standard_release("1.1.0"),
            broken,
            docs_only,
            standard_release("1.0.0"),
        ];

        let mut source = MockReleaseSource::new();
        source.expect_fetch_release_page().returning(move |_, _, _| {
            Ok(ReleasePage {
                releases: releases.clone(),
                end_cursor: None,
            })
        });
        serve_sums(&mut source);

        let mut records = get_versions(Arc::new(source), "owner", "repo").await.unwrap();
        records.sort_by(|a, b| a.version.cmp(&b.version));

        let versions: Vec<_> = records.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0.0", "1.1.0"]);
    }

    #[tokio::test]
    async fn get_versions_deduplicates_repeated_tags() {
        let releases = vec![standard_release("1.0.0"), standard_release("1.0.0")];
        let mut source = MockReleaseSource::new();
        source.expect_fetch_release_page().returning(move |_, _, _| {
            Ok(ReleasePage {
                releases: releases.clone(),
                end_cursor: None,
            })
        });
        serve_sums(&mut source);

        let records = get_versions(Arc::new(source), "owner", "repo").await.unwrap();

        assert_eq!(records.len(), 1);
    }

    /// Lists one release and takes `delay` to serve each asset download.
    struct SlowSource {
        release: Release,
        delay: std::time::Duration,
        completed_downloads: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ReleaseSource for SlowSource {
        async fn fetch_release_page(
            &self,
            _owner: &str,
            _repo: &str,
            _after: Option<String>,
        ) -> Result<ReleasePage, GitHubError> {
            Ok(ReleasePage {
                releases: vec![self.release.clone()],
                end_cursor: None,
            })
        }

        async fn repository_exists(&self, _owner: &str, _repo: &str) -> Result<bool, GitHubError> {
            Ok(true)
        }

        async fn download_asset(&self, _url: &str) -> Result<Vec<u8>, GitHubError> {
            tokio::time::sleep(self.delay).await;
            self.completed_downloads
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(b"abc123  pkg_1.0.0_linux_amd64.zip\n".to_vec())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_versions_dropped_by_caller_cancels_release_downloads() {
        let source = Arc::new(SlowSource {
            release: standard_release("1.0.0"),
            delay: std::time::Duration::from_millis(200),
            completed_downloads: std::sync::atomic::AtomicUsize::new(0),
        });

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            get_versions(source.clone(), "owner", "repo"),
        )
        .await;
        assert!(result.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        assert_eq!(
            source
                .completed_downloads
                .load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn get_versions_with_no_releases_is_empty() {
        let mut source = MockReleaseSource::new();
        source
            .expect_fetch_release_page()
            .returning(|_, _, _| Ok(ReleasePage::default()));

        let records = get_versions(Arc::new(source), "owner", "repo").await.unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn get_versions_fails_when_harvest_fails() {
        let mut source = MockReleaseSource::new();
        source
            .expect_fetch_release_page()
            .returning(|_, _, _| Err(GitHubError::RateLimited { retry_after_secs: Some(60) }));

        let result = get_versions(Arc::new(source), "owner", "repo").await;

        assert!(matches!(
            result,
            Err(ProviderError::Upstream(GitHubError::RateLimited { .. }))
        ));
    }

    fn single_release_source(release: Release) -> MockReleaseSource {
        let mut source = MockReleaseSource::new();
        source.expect_fetch_release_page().returning(move |_, _, _| {
            Ok(ReleasePage {
                releases: vec![release.clone()],
                end_cursor: None,
            })
        });
        serve_sums(&mut source);
        source
    }

    #[tokio::test]
    async fn get_version_resolves_requested_platform() {
        let source = single_release_source(standard_release("1.2.0"));

        let details = get_version(&source, "owner", "repo", "1.2.0", "linux", "amd64")
            .await
            .unwrap();

        assert_eq!(details.filename, "pkg_1.2.0_linux_amd64.zip");
        assert_eq!(details.shasum, "abc123");
        assert_eq!(details.protocols, vec!["5.0"]);
        assert_eq!(
            details.shasums_signature_url,
            "https://dl.example.com/pkg_1.2.0_SHA256SUMS.sig"
        );
    }

    #[tokio::test]
    async fn get_version_reports_missing_release_and_platform_as_not_found() {
        let source = single_release_source(standard_release("1.2.0"));
        let missing_release = get_version(&source, "owner", "repo", "9.9.9", "linux", "amd64")
            .await
            .unwrap_err();
        assert!(missing_release.is_not_found());

        let source = single_release_source(standard_release("1.2.0"));
        let missing_platform = get_version(&source, "owner", "repo", "1.2.0", "darwin", "arm64")
            .await
            .unwrap_err();
        assert!(matches!(missing_platform, ProviderError::AssetNotFound(_)));
    }

    #[tokio::test]
    async fn get_version_requires_checksum_signature() {
        let source = single_release_source(release(
            "v1.2.0",
            &[
                "pkg_1.2.0_linux_amd64.zip".to_string(),
                "pkg_1.2.0_SHA256SUMS".to_string(),
            ],
        ));

        let result = get_version(&source, "owner", "repo", "1.2.0", "linux", "amd64").await;

        assert!(matches!(result, Err(ProviderError::ShaSumsNotFound(_))));
    }
}
