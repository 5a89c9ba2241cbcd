//! Background repopulation of cached listings
//!
//! Reads that find a stale or missing entry hand a [`RefreshRequest`] to a
//! [`RefreshTrigger`]. The trigger runs [`Refresher::populate`] detached from
//! the caller; failures are logged and the next stale read tries again.

use std::sync::{Arc, Mutex};

#[cfg(test)]
use mockall::automock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::cache::{ListingKind, VersionCache};
use crate::error::RefreshError;
use crate::github::source::ReleaseSource;
use crate::modules;
use crate::providers;
use crate::providers::types::VersionRecord;
use crate::service::identity::{ModuleIdentity, ProviderIdentity};

/// "Populate versions for package X"; the namespace is already redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RefreshRequest {
    Provider {
        namespace: String,
        name: String,
    },
    Module {
        namespace: String,
        name: String,
        system: String,
    },
}

impl RefreshRequest {
    pub fn provider(identity: &ProviderIdentity) -> Self {
        Self::Provider {
            namespace: identity.namespace.clone(),
            name: identity.name.clone(),
        }
    }

    pub fn module(identity: &ModuleIdentity) -> Self {
        Self::Module {
            namespace: identity.namespace.clone(),
            name: identity.name.clone(),
            system: identity.system.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), RefreshError> {
        let fields = match self {
            Self::Provider { namespace, name } => vec![("namespace", namespace), ("name", name)],
            Self::Module {
                namespace,
                name,
                system,
            } => vec![("namespace", namespace), ("name", name), ("system", system)],
        };

        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(RefreshError::InvalidRequest(format!("{} is empty", field))),
            None => Ok(()),
        }
    }
}

/// Harvests, aggregates and stores the listing for one package
pub struct Refresher {
    source: Arc<dyn ReleaseSource>,
    cache: VersionCache,
}

impl Refresher {
    pub fn new(source: Arc<dyn ReleaseSource>, cache: VersionCache) -> Self {
        Self { source, cache }
    }

    /// Repopulates the cache entry for `request`.
    ///
    /// A fresh entry is left alone, so redundant triggers are cheap. The
    /// stored entry is replaced as a whole.
    pub async fn populate(&self, request: &RefreshRequest) -> Result<(), RefreshError> {
        request.validate()?;

        match request {
            RefreshRequest::Provider { namespace, name } => {
                self.populate_provider(&ProviderIdentity::new(namespace, name))
                    .await
            }
            RefreshRequest::Module {
                namespace,
                name,
                system,
            } => {
                self.populate_module(&ModuleIdentity::new(namespace, name, system))
                    .await
            }
        }
    }

    async fn populate_provider(&self, identity: &ProviderIdentity) -> Result<(), RefreshError> {
        let key = identity.cache_key();
        if self.is_fresh::<VersionRecord>(ListingKind::Provider, &key) {
            info!("Provider {} is fresh, skipping refresh", key);
            return Ok(());
        }

        let repo = identity.repo_name();
        self.ensure_exists(&identity.namespace, &repo).await?;

        let records =
            providers::get_versions(Arc::clone(&self.source), &identity.namespace, &repo).await?;
        self.cache.store(ListingKind::Provider, &key, &records)?;

        info!("Saved {} versions for provider {}", records.len(), key);
        Ok(())
    }

    async fn populate_module(&self, identity: &ModuleIdentity) -> Result<(), RefreshError> {
        let key = identity.cache_key();
        if self.is_fresh::<modules::ModuleVersion>(ListingKind::Module, &key) {
            info!("Module {} is fresh, skipping refresh", key);
            return Ok(());
        }

        let repo = identity.repo_name();
        self.ensure_exists(&identity.namespace, &repo).await?;

        let versions =
            modules::get_versions(self.source.as_ref(), &identity.namespace, &repo).await?;
        if versions.is_empty() {
            return Err(RefreshError::NoVersions(key));
        }
        self.cache.store(ListingKind::Module, &key, &versions)?;

        info!("Saved {} versions for module {}", versions.len(), key);
        Ok(())
    }

    fn is_fresh<T: DeserializeOwned>(&self, kind: ListingKind, key: &str) -> bool {
        match self.cache.get_item::<T>(kind, key) {
            Ok(Some(entry)) => !self.cache.is_stale(&entry),
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read cached {} {}: {}", kind.as_str(), key, e);
                false
            }
        }
    }

    async fn ensure_exists(&self, owner: &str, repo: &str) -> Result<(), RefreshError> {
        if self.source.repository_exists(owner, repo).await? {
            Ok(())
        } else {
            Err(RefreshError::RepositoryNotFound(format!("{}/{}", owner, repo)))
        }
    }
}

/// Fire-and-forget hand-off of refresh work
#[cfg_attr(test, automock)]
pub trait RefreshTrigger: Send + Sync {
    /// Enqueues `request`. Returns once it is queued, not once it has run.
    fn trigger(&self, request: RefreshRequest) -> Result<(), RefreshError>;
}

/// Runs each refresh as a task on the current tokio runtime
pub struct SpawnRefreshTrigger {
    refresher: Arc<Refresher>,
    tasks: Mutex<JoinSet<()>>,
}

impl SpawnRefreshTrigger {
    pub fn new(refresher: Arc<Refresher>) -> Self {
        Self {
            refresher,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Waits for every refresh queued so far to finish.
    pub async fn wait_for_pending(&self) -> Result<(), RefreshError> {
        let mut tasks = {
            let mut guard = self.tasks.lock().map_err(|_| RefreshError::LockPoisoned)?;
            std::mem::take(&mut *guard)
        };

        debug!("Waiting for {} pending refreshes", tasks.len());
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!("Refresh task failed to complete: {}", e);
            }
        }
        Ok(())
    }
}

impl RefreshTrigger for SpawnRefreshTrigger {
    fn trigger(&self, request: RefreshRequest) -> Result<(), RefreshError> {
        request.validate()?;
        let handle = Handle::try_current().map_err(|_| RefreshError::NoRuntime)?;

        let mut tasks = self.tasks.lock().map_err(|_| RefreshError::LockPoisoned)?;
        // Reap finished tasks so the set does not grow without bound
        while tasks.try_join_next().is_some() {}

        let refresher = Arc::clone(&self.refresher);
        debug!("Queueing refresh: {:?}", request);
        tasks.spawn_on(
            async move {
                let _ = refresher
                    .populate(&request)
                    .await
                    .inspect_err(|e| error!("Background refresh {:?} failed: {}", request, e));
            },
            &handle,
        );
        Ok(())
    }
}
