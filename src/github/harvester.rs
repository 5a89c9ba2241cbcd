//! Cursor-paginated release harvesting

use tracing::{debug, error, info};

use crate::error::GitHubError;
use crate::github::source::ReleaseSource;
use crate::github::types::Release;

/// Fetches every published release of a repository.
///
/// Pages through the listing until the source reports no further page.
/// Drafts and prereleases are dropped here. A failed page aborts the
/// whole harvest; no partial result is returned.
pub async fn fetch_releases(
    source: &dyn ReleaseSource,
    owner: &str,
    repo: &str,
) -> Result<Vec<Release>, GitHubError> {
    info!("Fetching releases for {}/{}", owner, repo);

    let mut releases = Vec::new();
    let mut cursor = None;

    loop {
        let page = source
            .fetch_release_page(owner, repo, cursor)
            .await
            .inspect_err(|e| error!("Failed to fetch releases for {}/{}: {}", owner, repo, e))?;

        releases.extend(page.releases.into_iter().filter(Release::is_published));

        match page.end_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    info!("Fetched {} releases for {}/{}", releases.len(), owner, repo);
    Ok(releases)
}

/// Finds the published release tagged `v<version>`.
///
/// Stops paging at the first match. Exhausting every page without a match
/// is `Ok(None)`, not an error.
pub async fn find_release(
    source: &dyn ReleaseSource,
    owner: &str,
    repo: &str,
    version: &str,
) -> Result<Option<Release>, GitHubError> {
    let tag = format!("v{}", version);
    debug!("Finding release {} in {}/{}", tag, owner, repo);

    let mut cursor = None;

    loop {
        let page = source
            .fetch_release_page(owner, repo, cursor)
            .await
            .inspect_err(|e| error!("Failed to fetch releases for {}/{}: {}", owner, repo, e))?;

        if let Some(release) = page
            .releases
            .into_iter()
            .find(|r| r.is_published() && r.tag_name == tag)
        {
            return Ok(Some(release));
        }

        match page.end_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    info!("Release {} not found in {}/{}", tag, owner, repo);
    Ok(None)
}
