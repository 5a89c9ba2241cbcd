//! Target platform detection from release asset filenames

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static PLATFORM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*_(?P<os>[a-zA-Z0-9]+)_(?P<arch>[a-zA-Z0-9]+)")
        .expect("platform pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    /// Filename suffix of the binary archive built for this platform
    pub fn archive_suffix(&self) -> String {
        format!("_{}_{}.zip", self.os, self.arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

/// Extracts the `<os>_<arch>` pair from an artifact filename.
///
/// Returns `None` when the name does not look like a platform binary.
pub fn extract_platform(artifact_name: &str) -> Option<Platform> {
    let captures = PLATFORM_PATTERN.captures(artifact_name)?;
    Some(Platform::new(&captures["os"], &captures["arch"]))
}
