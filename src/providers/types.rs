use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::versions::sort_newest_first;

/// One provider version as resolved from a release; the unit stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Release tag with the leading `v` stripped
    pub version: String,
    pub protocols: Vec<String>,
    pub download_details: Vec<DownloadDetails>,
}

/// Artifact locations and checksum of one platform binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadDetails {
    pub platform: Platform,
    pub filename: String,
    pub download_url: String,
    pub shasums_url: String,
    /// Empty when the release ships no checksum signature
    pub shasums_signature_url: String,
    pub shasum: String,
}

impl VersionRecord {
    pub fn platforms(&self) -> Vec<Platform> {
        self.download_details
            .iter()
            .map(|details| details.platform.clone())
            .collect()
    }

    /// Converts to the listing shape of the registry protocol
    pub fn to_listing(&self) -> Version {
        Version {
            version: self.version.clone(),
            protocols: self.protocols.clone(),
            platforms: self.platforms(),
        }
    }

    /// Download details for one platform, without signing keys
    pub fn version_details(&self, os: &str, arch: &str) -> Option<VersionDetails> {
        self.download_details
            .iter()
            .find(|details| details.platform.os == os && details.platform.arch == arch)
            .map(|details| VersionDetails {
                protocols: self.protocols.clone(),
                os: details.platform.os.clone(),
                arch: details.platform.arch.clone(),
                filename: details.filename.clone(),
                download_url: details.download_url.clone(),
                shasums_url: details.shasums_url.clone(),
                shasums_signature_url: details.shasums_signature_url.clone(),
                shasum: details.shasum.clone(),
                signing_keys: SigningKeys::default(),
            })
    }
}

/// Finds the download details of `version` for `os`/`arch` in a record list.
pub fn find_version_details(
    records: &[VersionRecord],
    version: &str,
    os: &str,
    arch: &str,
) -> Option<VersionDetails> {
    records
        .iter()
        .find(|record| record.version == version)
        .and_then(|record| record.version_details(os, arch))
}

/// Removes repeated versions, keeping the first occurrence of each.
pub fn dedup_versions(records: Vec<VersionRecord>) -> Vec<VersionRecord> {
    let mut unique = IndexMap::with_capacity(records.len());
    for record in records {
        unique.entry(record.version.clone()).or_insert(record);
    }
    unique.into_values().collect()
}

/// An individual provider version in a listing response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
    pub protocols: Vec<String>,
    pub platforms: Vec<Platform>,
}

/// Listing response for a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVersionListing {
    pub versions: Vec<Version>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ProviderVersionListing {
    /// Builds a listing sorted newest first
    pub fn from_records(records: &[VersionRecord], warnings: Vec<String>) -> Self {
        let mut versions: Vec<Version> = records.iter().map(VersionRecord::to_listing).collect();
        sort_newest_first(&mut versions, |v| v.version.as_str());
        Self { versions, warnings }
    }
}

/// Download details for one version and platform, as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDetails {
    pub protocols: Vec<String>,
    pub os: String,
    pub arch: String,
    pub filename: String,
    pub download_url: String,
    pub shasums_url: String,
    pub shasums_signature_url: String,
    pub shasum: String,
    pub signing_keys: SigningKeys,
}

/// GPG public keys that sign a provider's checksums
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKeys {
    pub gpg_public_keys: Vec<GpgPublicKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpgPublicKey {
    pub key_id: String,
    pub ascii_armor: String,
}
