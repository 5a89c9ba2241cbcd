use indexmap::IndexSet;
use tracing::{debug, info};

use crate::error::GitHubError;
use crate::github::harvester::{fetch_releases, find_release};
use crate::github::source::ReleaseSource;
use crate::modules::types::ModuleVersion;

/// Lists every published version of a module repository, first tag wins.
pub async fn get_versions(
    source: &dyn ReleaseSource,
    owner: &str,
    repo: &str,
) -> Result<Vec<ModuleVersion>, GitHubError> {
    let releases = fetch_releases(source, owner, repo).await?;

    let versions: IndexSet<String> = releases
        .iter()
        .map(|release| release.version().to_string())
        .collect();

    info!("Found {} module versions for {}/{}", versions.len(), owner, repo);
    Ok(versions
        .into_iter()
        .map(|version| ModuleVersion { version })
        .collect())
}

/// Git source address of one module version.
///
/// Uses the `v<version>` tag when such a release exists, otherwise the bare version.
pub async fn download_location(
    source: &dyn ReleaseSource,
    owner: &str,
    repo: &str,
    version: &str,
) -> Result<String, GitHubError> {
    let git_ref = match find_release(source, owner, repo, version).await? {
        Some(release) => release.tag_name,
        None => {
            debug!("No v{} release in {}/{}, using bare ref", version, owner, repo);
            version.to_string()
        }
    };

    Ok(format!(
        "git::https://github.com/{}/{}?ref={}",
        owner, repo, git_ref
    ))
}
