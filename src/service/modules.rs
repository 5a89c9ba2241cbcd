use tracing::info;

use crate::cache::ListingKind;
use crate::error::ServiceError;
use crate::modules;
use crate::modules::types::{ModuleLocation, ModuleVersion, ModuleVersionListing};
use crate::service::RegistryService;
use crate::service::identity::ModuleIdentity;
use crate::service::refresh::RefreshRequest;
use crate::versions::normalize_version;

impl RegistryService {
    /// Versions of a module; `None` when its repository does not exist.
    pub async fn resolve_module(
        &self,
        identity: &ModuleIdentity,
    ) -> Result<Option<Vec<ModuleVersion>>, ServiceError> {
        let key = identity.cache_key();

        if let Some(entry) = self.cached::<ModuleVersion>(ListingKind::Module, &key) {
            if self.cache.is_stale(&entry) {
                info!("Module {} is stale, refreshing in background", key);
                self.request_refresh(RefreshRequest::module(identity));
            }
            return Ok(Some(entry.versions));
        }

        let repo = identity.repo_name();
        if !self.source.repository_exists(&identity.namespace, &repo).await? {
            info!("Repository {}/{} does not exist", identity.namespace, repo);
            return Ok(None);
        }

        self.request_refresh(RefreshRequest::module(identity));
        let versions =
            modules::get_versions(self.source.as_ref(), &identity.namespace, &repo).await?;
        Ok(Some(versions))
    }

    pub async fn list_module_versions(
        &self,
        namespace: &str,
        name: &str,
        system: &str,
    ) -> Result<Option<ModuleVersionListing>, ServiceError> {
        let identity = ModuleIdentity::new(namespace, name, system);
        Ok(self
            .resolve_module(&identity)
            .await?
            .map(|versions| ModuleVersionListing::from_versions(&versions)))
    }

    /// Git source location of one module version; `None` when the repository is absent.
    pub async fn module_download(
        &self,
        namespace: &str,
        name: &str,
        system: &str,
        version: &str,
    ) -> Result<Option<ModuleLocation>, ServiceError> {
        let identity = ModuleIdentity::new(namespace, name, system);
        let repo = identity.repo_name();
        if !self.source.repository_exists(namespace, &repo).await? {
            info!("Repository {}/{} does not exist", namespace, repo);
            return Ok(None);
        }

        let location = modules::download_location(
            self.source.as_ref(),
            namespace,
            &repo,
            normalize_version(version),
        )
        .await?;
        Ok(Some(ModuleLocation { location }))
    }
}
