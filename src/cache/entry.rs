use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::codec::{decode, encode};
use crate::cache::store::{ListingKind, ListingStore};
use crate::config::ALLOWED_AGE_MINUTES;
use crate::error::CacheError;

/// A cached version list for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<T> {
    pub package_key: String,
    pub versions: Vec<T>,
    pub last_updated: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_stale_at(&self, allowed_age: TimeDelta, now: DateTime<Utc>) -> bool {
        now - self.last_updated > allowed_age
    }
}

/// Typed view over a [`ListingStore`] with the staleness policy attached
#[derive(Clone)]
pub struct VersionCache {
    store: Arc<dyn ListingStore>,
    allowed_age: TimeDelta,
}

impl VersionCache {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self::with_allowed_age(store, TimeDelta::minutes(ALLOWED_AGE_MINUTES))
    }

    pub fn with_allowed_age(store: Arc<dyn ListingStore>, allowed_age: TimeDelta) -> Self {
        Self { store, allowed_age }
    }

    pub fn allowed_age(&self) -> TimeDelta {
        self.allowed_age
    }

    pub fn is_stale<T>(&self, entry: &CacheEntry<T>) -> bool {
        entry.is_stale_at(self.allowed_age, Utc::now())
    }

    /// Loads and decodes the entry under `key`; `Ok(None)` when absent.
    pub fn get_item<T: DeserializeOwned>(
        &self,
        kind: ListingKind,
        key: &str,
    ) -> Result<Option<CacheEntry<T>>, CacheError> {
        let Some(item) = self.store.get_item(kind, key)? else {
            return Ok(None);
        };

        let versions: Vec<T> = decode(&item.data)?;
        debug!(
            "Cache hit for {} {} ({} versions, updated {})",
            kind.as_str(),
            key,
            versions.len(),
            item.last_updated
        );

        Ok(Some(CacheEntry {
            package_key: item.package_key,
            versions,
            last_updated: item.last_updated,
        }))
    }

    /// Replaces the entry under `key` with `versions`.
    pub fn store<T: Serialize>(
        &self,
        kind: ListingKind,
        key: &str,
        versions: &[T],
    ) -> Result<DateTime<Utc>, CacheError> {
        let data = encode(&versions)?;
        self.store.put_item(kind, key, &data)
    }
}
