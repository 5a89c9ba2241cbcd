//! Release records as returned by the source host

use serde::{Deserialize, Serialize};

use crate::versions::normalize_version;

/// A published release. Read-only: nothing in this crate mutates one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: String,
    pub tag_name: String,
    pub is_draft: bool,
    pub is_prerelease: bool,
    pub is_latest: bool,
    pub assets: Vec<ReleaseAsset>,
    pub tarball_url: Option<String>,
}

impl Release {
    /// Drafts and prereleases never reach version listings
    pub fn is_published(&self) -> bool {
        !self.is_draft && !self.is_prerelease
    }

    /// Tag with a single leading `v` stripped
    pub fn version(&self) -> &str {
        normalize_version(&self.tag_name)
    }

    pub fn find_asset_by_suffix(&self, suffix: &str) -> Option<&ReleaseAsset> {
        find_asset_by_suffix(&self.assets, suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub id: String,
    pub name: String,
    pub download_url: String,
}

/// One page of the release listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleasePage {
    pub releases: Vec<Release>,
    /// Cursor for the next page; `None` when this is the last page
    pub end_cursor: Option<String>,
}

/// Returns the first asset whose name ends with `suffix`.
pub fn find_asset_by_suffix<'a>(assets: &'a [ReleaseAsset], suffix: &str) -> Option<&'a ReleaseAsset> {
    assets.iter().find(|asset| asset.name.ends_with(suffix))
}
