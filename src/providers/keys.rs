//! Namespace → GPG signing key lookup backed by a key directory

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;
use tracing::{debug, warn};

use crate::error::KeyError;
use crate::providers::types::GpgPublicKey;

const ARMOR_HEADER: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----";

/// Looks up the public keys that sign a namespace's releases
#[cfg_attr(test, automock)]
pub trait KeyStore: Send + Sync {
    fn keys_for_namespace(&self, namespace: &str) -> Result<Vec<GpgPublicKey>, KeyError>;
}

/// Reads `<root>/<namespace>/<KEY_ID>.asc` files.
///
/// Each file holds one ASCII-armored public key; its stem, upper-cased,
/// is the key id.
pub struct DirectoryKeyStore {
    root: PathBuf,
}

impl DirectoryKeyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_key(path: &Path) -> Result<Option<GpgPublicKey>, KeyError> {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Ok(None);
        };

        let ascii_armor = fs::read_to_string(path).map_err(|source| KeyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !ascii_armor.trim_start().starts_with(ARMOR_HEADER) {
            return Err(KeyError::InvalidKey(path.to_path_buf()));
        }

        Ok(Some(GpgPublicKey {
            key_id: stem.to_uppercase(),
            ascii_armor,
        }))
    }
}

impl KeyStore for DirectoryKeyStore {
    fn keys_for_namespace(&self, namespace: &str) -> Result<Vec<GpgPublicKey>, KeyError> {
        let dir = self.root.join(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No key directory for namespace {}", namespace);
                return Ok(Vec::new());
            }
            Err(source) => return Err(KeyError::Io { path: dir, source }),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| KeyError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        // read_dir order is platform-dependent
        paths.sort();

        let mut keys = Vec::with_capacity(paths.len());
        for path in &paths {
            match Self::read_key(path)? {
                Some(key) => keys.push(key),
                None => warn!("Skipping key file with non UTF-8 name: {:?}", path),
            }
        }

        debug!("Loaded {} keys for namespace {}", keys.len(), namespace);
        Ok(keys)
    }
}
