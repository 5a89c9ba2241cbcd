//! Resolves platform binaries, checksums and protocols from a release's assets

use std::collections::HashMap;

use futures::future::try_join;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::github::source::ReleaseSource;
use crate::github::types::{Release, ReleaseAsset, find_asset_by_suffix};
use crate::platform::{Platform, extract_platform};
use crate::providers::manifest::{find_and_parse_manifest, protocols_or_default};
use crate::providers::shasums::{SHASUMS_SIGNATURE_SUFFIX, SHASUMS_SUFFIX, download_shasums};
use crate::providers::types::{DownloadDetails, VersionRecord};

/// Platforms for which the release ships a binary, in asset order.
pub fn discover_platforms(assets: &[ReleaseAsset]) -> Vec<Platform> {
    assets
        .iter()
        .filter_map(|asset| extract_platform(&asset.name))
        .collect()
}

/// Checksum asset URLs shared by every platform of a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaSumsUrls {
    pub shasums_url: String,
    /// Empty when no signature asset exists
    pub signature_url: String,
}

/// Builds the download details of one platform.
///
/// Returns `None` when the binary is absent or has no checksum line.
pub fn assemble_platform(
    platform: &Platform,
    assets: &[ReleaseAsset],
    shasums: &HashMap<String, String>,
    urls: &ShaSumsUrls,
) -> Option<DownloadDetails> {
    let Some(binary) = find_asset_by_suffix(assets, &platform.archive_suffix()) else {
        warn!("Dropping platform {}: binary asset not found", platform);
        return None;
    };

    let Some(shasum) = shasums.get(&binary.name) else {
        warn!("Dropping platform {}: no checksum for {}", platform, binary.name);
        return None;
    };

    Some(DownloadDetails {
        platform: platform.clone(),
        filename: binary.name.clone(),
        download_url: binary.download_url.clone(),
        shasums_url: urls.shasums_url.clone(),
        shasums_signature_url: urls.signature_url.clone(),
        shasum: shasum.clone(),
    })
}

/// Resolves one release into a version record.
///
/// `Ok(None)` means the release has no usable platform binary and should be
/// left out of the listing. Errors are scoped to this release.
pub async fn resolve_release(
    source: &dyn ReleaseSource,
    release: &Release,
) -> Result<Option<VersionRecord>, ProviderError> {
    let platforms = discover_platforms(&release.assets);
    if platforms.is_empty() {
        debug!("Release {} has no platform binaries", release.tag_name);
        return Ok(None);
    }

    let shasums_asset = release
        .find_asset_by_suffix(SHASUMS_SUFFIX)
        .ok_or_else(|| ProviderError::ShaSumsNotFound(release.tag_name.clone()))?;
    let urls = ShaSumsUrls {
        shasums_url: shasums_asset.download_url.clone(),
        signature_url: release
            .find_asset_by_suffix(SHASUMS_SIGNATURE_SUFFIX)
            .map(|asset| asset.download_url.clone())
            .unwrap_or_default(),
    };

    let (manifest, shasums) = try_join(
        find_and_parse_manifest(source, &release.assets),
        download_shasums(source, shasums_asset),
    )
    .await?;

    let download_details: Vec<DownloadDetails> = platforms
        .iter()
        .filter_map(|platform| assemble_platform(platform, &release.assets, &shasums, &urls))
        .collect();

    if download_details.is_empty() {
        debug!("Release {} has no checksummed platforms", release.tag_name);
        return Ok(None);
    }

    Ok(Some(VersionRecord {
        version: release.version().to_string(),
        protocols: protocols_or_default(manifest),
        download_details,
    }))
}
