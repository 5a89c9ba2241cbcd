use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::ListingKind;
use crate::error::ServiceError;
use crate::providers;
use crate::providers::types::{
    ProviderVersionListing, SigningKeys, VersionDetails, VersionRecord, find_version_details,
};
use crate::providers::warnings::provider_warnings;
use crate::service::RegistryService;
use crate::service::identity::ProviderIdentity;
use crate::service::refresh::RefreshRequest;
use crate::versions::normalize_version;

impl RegistryService {
    fn provider_identity(&self, namespace: &str, provider_type: &str) -> ProviderIdentity {
        ProviderIdentity::new(self.effective_namespace(namespace), provider_type)
    }

    /// Version records for a provider; `None` when its repository does not exist.
    ///
    /// Never waits on a refresh when the cache holds an entry, stale or not.
    pub async fn resolve_provider(
        &self,
        identity: &ProviderIdentity,
    ) -> Result<Option<Vec<VersionRecord>>, ServiceError> {
        let key = identity.cache_key();

        if let Some(entry) = self.cached::<VersionRecord>(ListingKind::Provider, &key) {
            if self.cache.is_stale(&entry) {
                info!("Provider {} is stale, refreshing in background", key);
                self.request_refresh(RefreshRequest::provider(identity));
            }
            return Ok(Some(entry.versions));
        }

        let repo = identity.repo_name();
        if !self.source.repository_exists(&identity.namespace, &repo).await? {
            info!("Repository {}/{} does not exist", identity.namespace, repo);
            return Ok(None);
        }

        self.request_refresh(RefreshRequest::provider(identity));
        let records =
            providers::get_versions(Arc::clone(&self.source), &identity.namespace, &repo).await?;
        Ok(Some(records))
    }

    /// Version listing for `namespace/provider_type`, newest first.
    pub async fn list_provider_versions(
        &self,
        namespace: &str,
        provider_type: &str,
    ) -> Result<Option<ProviderVersionListing>, ServiceError> {
        let identity = self.provider_identity(namespace, provider_type);
        let Some(records) = self.resolve_provider(&identity).await? else {
            return Ok(None);
        };

        let warnings = provider_warnings(namespace, provider_type);
        Ok(Some(ProviderVersionListing::from_records(&records, warnings)))
    }

    /// Download details of one version and platform, with signing keys attached.
    ///
    /// `None` when the version or platform cannot be resolved.
    pub async fn resolve_download(
        &self,
        namespace: &str,
        provider_type: &str,
        version: &str,
        os: &str,
        arch: &str,
    ) -> Result<Option<VersionDetails>, ServiceError> {
        let identity = self.provider_identity(namespace, provider_type);
        let version = normalize_version(version);

        let details = match self.cached_download(&identity, version, os, arch) {
            Some(cached) => cached,
            None => self.fetch_download(&identity, version, os, arch).await?,
        };
        let Some(mut details) = details else {
            return Ok(None);
        };

        let keys = self.keys.keys_for_namespace(&identity.namespace)?;
        details.signing_keys = SigningKeys {
            gpg_public_keys: keys,
        };
        Ok(Some(details))
    }

    /// Looks the download up in the cache. The outer `None` means no entry.
    fn cached_download(
        &self,
        identity: &ProviderIdentity,
        version: &str,
        os: &str,
        arch: &str,
    ) -> Option<Option<VersionDetails>> {
        let key = identity.cache_key();
        let entry = self.cached::<VersionRecord>(ListingKind::Provider, &key)?;

        if self.cache.is_stale(&entry) {
            info!("Provider {} is stale, refreshing in background", key);
            self.request_refresh(RefreshRequest::provider(identity));
        }

        let details = find_version_details(&entry.versions, version, os, arch);
        if details.is_none() {
            debug!("Cached {} has no {} for {}_{}", key, version, os, arch);
        }
        Some(details)
    }

    async fn fetch_download(
        &self,
        identity: &ProviderIdentity,
        version: &str,
        os: &str,
        arch: &str,
    ) -> Result<Option<VersionDetails>, ServiceError> {
        let repo = identity.repo_name();
        if !self.source.repository_exists(&identity.namespace, &repo).await? {
            info!("Repository {}/{} does not exist", identity.namespace, repo);
            return Ok(None);
        }
        self.request_refresh(RefreshRequest::provider(identity));

        match providers::get_version(
            self.source.as_ref(),
            &identity.namespace,
            &repo,
            version,
            os,
            arch,
        )
        .await
        {
            Ok(details) => Ok(Some(details)),
            Err(e) if e.is_not_found() => {
                info!("{} {} {}_{} not found: {}", identity, version, os, arch, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
