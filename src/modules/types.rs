use serde::{Deserialize, Serialize};

use crate::versions::sort_newest_first;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersion {
    pub version: String,
}

/// Listing response for a module: `{"modules":[{"versions":[...]}]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersionListing {
    pub modules: Vec<ModuleVersions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersions {
    pub versions: Vec<ModuleVersion>,
}

impl ModuleVersionListing {
    pub fn from_versions(versions: &[ModuleVersion]) -> Self {
        let mut versions = versions.to_vec();
        sort_newest_first(&mut versions, |v| v.version.as_str());
        Self {
            modules: vec![ModuleVersions { versions }],
        }
    }
}

/// Where the module source for one version can be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleLocation {
    pub location: String,
}
