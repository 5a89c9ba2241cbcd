//! GitHub implementation of [`ReleaseSource`]
//!
//! Releases are listed through the GraphQL API (one request per page of up to
//! 100 releases with their assets inline), the repository probe uses the REST
//! API, and assets are downloaded with a plain authenticated GET.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{FETCH_TIMEOUT_MS, GitHubConfig, RELEASE_ASSETS_PAGE_SIZE, RELEASES_PAGE_SIZE};
use crate::error::GitHubError;
use crate::github::source::ReleaseSource;
use crate::github::types::{Release, ReleaseAsset, ReleasePage};

const USER_AGENT: &str = "release-registry";

const RELEASES_QUERY: &str = r#"
query($owner: String!, $name: String!, $perPage: Int!, $assetsPerPage: Int!, $endCursor: String) {
  repository(owner: $owner, name: $name) {
    releases(first: $perPage, orderBy: {field: CREATED_AT, direction: DESC}, after: $endCursor) {
      pageInfo { hasNextPage endCursor }
      nodes {
        id
        tagName
        isDraft
        isLatest
        isPrerelease
        releaseAssets(first: $assetsPerPage) { nodes { id name downloadUrl } }
        tagCommit { tarballUrl }
      }
    }
  }
}
"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: ReleasesVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReleasesVariables<'a> {
    owner: &'a str,
    name: &'a str,
    per_page: usize,
    assets_per_page: usize,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    releases: ReleaseConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseConnection {
    page_info: PageInfo,
    nodes: Vec<ReleaseNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseNode {
    id: String,
    tag_name: String,
    is_draft: bool,
    is_latest: bool,
    is_prerelease: bool,
    release_assets: AssetConnection,
    tag_commit: Option<TagCommit>,
}

#[derive(Debug, Deserialize)]
struct AssetConnection {
    nodes: Vec<AssetNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetNode {
    id: String,
    name: String,
    download_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagCommit {
    tarball_url: Option<String>,
}

impl From<ReleaseNode> for Release {
    fn from(node: ReleaseNode) -> Self {
        Self {
            id: node.id,
            tag_name: node.tag_name,
            is_draft: node.is_draft,
            is_prerelease: node.is_prerelease,
            is_latest: node.is_latest,
            assets: node
                .release_assets
                .nodes
                .into_iter()
                .map(|asset| ReleaseAsset {
                    id: asset.id,
                    name: asset.name,
                    download_url: asset.download_url,
                })
                .collect(),
            tarball_url: node.tag_commit.and_then(|commit| commit.tarball_url),
        }
    }
}

/// Release source backed by the GitHub GraphQL and REST APIs
pub struct GitHubClient {
    client: reqwest::Client,
    graphql_url: String,
    rest_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;

        Ok(Self {
            client,
            graphql_url: config.graphql_url.clone(),
            rest_url: config.rest_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Maps rate limiting and non-2xx statuses to errors
fn check_status(response: Response, url: &str) -> Result<Response, GitHubError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(GitHubError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        warn!("GitHub returned status {}: {}", status, url);
        return Err(GitHubError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response)
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubClient {
    async fn fetch_release_page(
        &self,
        owner: &str,
        repo: &str,
        after: Option<String>,
    ) -> Result<ReleasePage, GitHubError> {
        debug!("Fetching release page for {}/{} after {:?}", owner, repo, after);

        let body = GraphQlRequest {
            query: RELEASES_QUERY,
            variables: ReleasesVariables {
                owner,
                name: repo,
                per_page: RELEASES_PAGE_SIZE,
                assets_per_page: RELEASE_ASSETS_PAGE_SIZE,
                end_cursor: after,
            },
        };

        let response = self
            .request(Method::POST, &self.graphql_url)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response, &self.graphql_url)?;

        let payload: GraphQlResponse<RepositoryData> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub releases response: {}", e);
            GitHubError::InvalidResponse(e.to_string())
        })?;

        if !payload.errors.is_empty() {
            let messages: Vec<_> = payload.errors.into_iter().map(|e| e.message).collect();
            return Err(GitHubError::GraphQl(messages.join("; ")));
        }

        let repository = payload
            .data
            .ok_or_else(|| GitHubError::InvalidResponse("response has no data".to_string()))?
            .repository
            .ok_or_else(|| GitHubError::RepositoryNotFound(format!("{}/{}", owner, repo)))?;

        let connection = repository.releases;
        let end_cursor = if connection.page_info.has_next_page {
            connection.page_info.end_cursor
        } else {
            None
        };

        Ok(ReleasePage {
            releases: connection.nodes.into_iter().map(Release::from).collect(),
            end_cursor,
        })
    }

    async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool, GitHubError> {
        let url = format!("{}/repos/{}/{}", self.rest_url, owner, repo);

        let response = self
            .request(Method::GET, &url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Repository {}/{} does not exist", owner, repo);
            return Ok(false);
        }

        check_status(response, &url)?;
        Ok(true)
    }

    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, GitHubError> {
        debug!("Downloading asset {}", url);

        let response = self.request(Method::GET, url).send().await?;
        let response = check_status(response, url)?;
        let bytes = response.bytes().await?;

        Ok(bytes.to_vec())
    }
}
