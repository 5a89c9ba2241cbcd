//! Read path of the registry: refresh-ahead cache-aside over the release source
//!
//! A read serves whatever the cache holds, asking for a background refresh
//! when the entry is stale. Only a cache miss waits on upstream.
//!
//! # Modules
//!
//! - [`identity`]: Package identities and repository naming
//! - [`refresh`]: Background populate and its trigger
//! - [`providers`]: Provider listing and download resolution
//! - [`modules`]: Module listing and download location

pub mod identity;
pub mod modules;
pub mod providers;
pub mod refresh;

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::cache::{CacheEntry, ListingKind, VersionCache};
use crate::github::source::ReleaseSource;
use crate::providers::keys::KeyStore;

pub use identity::{ModuleIdentity, ProviderIdentity};
pub use refresh::{RefreshRequest, RefreshTrigger, Refresher, SpawnRefreshTrigger};

/// Registry entry points; every collaborator is injected
pub struct RegistryService {
    source: Arc<dyn ReleaseSource>,
    cache: VersionCache,
    keys: Arc<dyn KeyStore>,
    trigger: Arc<dyn RefreshTrigger>,
    namespace_redirects: HashMap<String, String>,
}

impl RegistryService {
    pub fn new(
        source: Arc<dyn ReleaseSource>,
        cache: VersionCache,
        keys: Arc<dyn KeyStore>,
        trigger: Arc<dyn RefreshTrigger>,
        namespace_redirects: HashMap<String, String>,
    ) -> Self {
        Self {
            source,
            cache,
            keys,
            trigger,
            namespace_redirects,
        }
    }

    /// Namespace that actually publishes the provider's releases
    pub fn effective_namespace<'a>(&'a self, namespace: &'a str) -> &'a str {
        self.namespace_redirects
            .get(namespace)
            .map(String::as_str)
            .unwrap_or(namespace)
    }

    /// Reads a cache entry, treating a read failure like a miss.
    fn cached<T: DeserializeOwned>(&self, kind: ListingKind, key: &str) -> Option<CacheEntry<T>> {
        self.cache
            .get_item(kind, key)
            .inspect_err(|e| warn!("Cache read failed for {} {}: {}", kind.as_str(), key, e))
            .ok()
            .flatten()
    }

    fn request_refresh(&self, request: RefreshRequest) {
        let _ = self
            .trigger
            .trigger(request)
            .inspect_err(|e| error!("Failed to trigger refresh: {}", e));
    }
}

/// The registry's well-known service discovery document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDiscovery {
    #[serde(rename = "modules.v1")]
    pub modules_v1: String,
    #[serde(rename = "providers.v1")]
    pub providers_v1: String,
}

pub fn service_discovery() -> ServiceDiscovery {
    ServiceDiscovery {
        modules_v1: "/v1/modules/".to_string(),
        providers_v1: "/v1/providers/".to_string(),
    }
}
