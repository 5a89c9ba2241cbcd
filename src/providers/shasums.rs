//! SHA256SUMS checksum manifests

use std::collections::HashMap;

use crate::error::ProviderError;
use crate::github::source::ReleaseSource;
use crate::github::types::ReleaseAsset;

pub const SHASUMS_SUFFIX: &str = "_SHA256SUMS";
pub const SHASUMS_SIGNATURE_SUFFIX: &str = "_SHA256SUMS.sig";

/// Parses `<hex-digest>  <filename>` lines into a filename → digest map.
///
/// Lines that do not have exactly two fields are ignored.
pub fn parse_shasums(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let digest = fields.next()?;
            let filename = fields.next()?;
            if fields.next().is_some() {
                return None;
            }
            Some((filename.to_string(), digest.to_string()))
        })
        .collect()
}

/// Downloads and parses the checksum asset.
pub async fn download_shasums(
    source: &dyn ReleaseSource,
    asset: &ReleaseAsset,
) -> Result<HashMap<String, String>, ProviderError> {
    let contents = source.download_asset(&asset.download_url).await?;
    Ok(parse_shasums(&String::from_utf8_lossy(&contents)))
}
