//! Registry service test utilities

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::TimeDelta;
use tempfile::TempDir;

use release_registry::cache::{SqliteStore, VersionCache};
use release_registry::config::ALLOWED_AGE_MINUTES;
use release_registry::github::ReleaseSource;
use release_registry::providers::DirectoryKeyStore;
use release_registry::service::{Refresher, RegistryService, SpawnRefreshTrigger};

pub const TEST_ARMOR: &str =
    "-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nmQINBGB...\n-----END PGP PUBLIC KEY BLOCK-----\n";

/// A service wired to a real on-disk cache and key directory
pub struct TestRegistry {
    pub service: RegistryService,
    pub refresher: Arc<Refresher>,
    pub trigger: Arc<SpawnRefreshTrigger>,
    pub cache: VersionCache,
    _temp_dir: TempDir,
}

pub fn write_key(keys_dir: &Path, namespace: &str, key_id: &str) {
    let dir = keys_dir.join(namespace);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{}.asc", key_id)), TEST_ARMOR).unwrap();
}

/// Create a registry over `source` with a fresh cache and the given namespace keys
pub fn create_test_registry(
    source: Arc<dyn ReleaseSource>,
    key_namespaces: &[(&str, &str)],
    redirects: &[(&str, &str)],
) -> TestRegistry {
    create_test_registry_with_allowed_age(
        source,
        key_namespaces,
        redirects,
        TimeDelta::minutes(ALLOWED_AGE_MINUTES),
    )
}

pub fn create_test_registry_with_allowed_age(
    source: Arc<dyn ReleaseSource>,
    key_namespaces: &[(&str, &str)],
    redirects: &[(&str, &str)],
    allowed_age: TimeDelta,
) -> TestRegistry {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::new(&temp_dir.path().join("listings.db")).unwrap();
    let cache = VersionCache::with_allowed_age(Arc::new(store), allowed_age);

    let keys_dir = temp_dir.path().join("keys");
    for (namespace, key_id) in key_namespaces {
        write_key(&keys_dir, namespace, key_id);
    }

    let refresher = Arc::new(Refresher::new(source.clone(), cache.clone()));
    let trigger = Arc::new(SpawnRefreshTrigger::new(refresher.clone()));
    let redirects: HashMap<String, String> = redirects
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

    let service = RegistryService::new(
        source,
        cache.clone(),
        Arc::new(DirectoryKeyStore::new(keys_dir)),
        trigger.clone(),
        redirects,
    );

    TestRegistry {
        service,
        refresher,
        trigger,
        cache,
        _temp_dir: temp_dir,
    }
}
