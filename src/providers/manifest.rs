//! Protocol manifest published alongside provider releases

use serde::Deserialize;
use tracing::debug;

use crate::config::DEFAULT_PROTOCOL_VERSIONS;
use crate::error::ProviderError;
use crate::github::source::ReleaseSource;
use crate::github::types::{ReleaseAsset, find_asset_by_suffix};

pub const MANIFEST_SUFFIX: &str = "_manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub version: Option<f64>,
    #[serde(default)]
    pub metadata: ManifestMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub protocol_versions: Vec<String>,
}

pub fn parse_manifest(contents: &[u8]) -> Result<Manifest, ProviderError> {
    serde_json::from_slice(contents).map_err(ProviderError::ManifestInvalid)
}

/// Downloads and parses the release manifest, if the release has one.
pub async fn find_and_parse_manifest(
    source: &dyn ReleaseSource,
    assets: &[ReleaseAsset],
) -> Result<Option<Manifest>, ProviderError> {
    let Some(asset) = find_asset_by_suffix(assets, MANIFEST_SUFFIX) else {
        debug!("No manifest asset, using default protocols");
        return Ok(None);
    };

    let contents = source.download_asset(&asset.download_url).await?;
    parse_manifest(&contents).map(Some)
}

/// Protocol versions declared by the manifest, or the default list.
pub fn protocols_or_default(manifest: Option<Manifest>) -> Vec<String> {
    match manifest {
        Some(manifest) if !manifest.metadata.protocol_versions.is_empty() => {
            manifest.metadata.protocol_versions
        }
        _ => DEFAULT_PROTOCOL_VERSIONS
            .iter()
            .map(|p| p.to_string())
            .collect(),
    }
}
