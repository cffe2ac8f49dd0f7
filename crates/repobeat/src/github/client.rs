//! GitHub API client creation and the `ResourceFetcher` implementation.

use std::sync::Arc;

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;

use super::convert::{
    to_branch, to_contributor, to_identity, to_license_info, to_participation, to_release,
    to_repo_metadata,
};
use super::error::{GitHubError, to_platform_error};
use super::types::{
    AuthenticatedUserDto, BranchDto, ContributorDto, LanguagesDto, LicenseContentDto, PAGE_SIZE,
    PageParams, ParticipationDto, ReleaseDto, RepositoryDto,
};
use crate::platform::{
    self, Branch, Contributor, LanguageBytes, LicenseInfo, Participation, Release, RepoMetadata,
    ResourceFetcher,
};
use crate::target::RepositoryIdentity;

/// Create an Octocrab instance.
///
/// Without a token the client is unauthenticated and subject to the much lower
/// anonymous rate limit. `api_url` points the client at a GitHub Enterprise
/// server instead of api.github.com.
pub fn create_client(token: Option<&str>, api_url: Option<&str>) -> Result<Octocrab, GitHubError> {
    let mut builder = Octocrab::builder();

    if let Some(url) = api_url {
        builder = builder
            .base_uri(url)
            .map_err(|_| GitHubError::InvalidUrl(url.to_string()))?;
    }
    if let Some(token) = token {
        builder = builder.personal_token(token.to_string());
    }

    builder.build().map_err(GitHubError::Api)
}

/// GitHub implementation of [`ResourceFetcher`].
///
/// Cheap to clone; clones share one Octocrab instance and its connection pool.
#[derive(Clone)]
pub struct GitHubFetcher {
    inner: Arc<Octocrab>,
    authenticated: bool,
}

impl GitHubFetcher {
    pub fn new(token: Option<&str>, api_url: Option<&str>) -> Result<Self, GitHubError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::info!("No access token configured; using unauthenticated GitHub access");
        }

        let client = create_client(token, api_url)?;
        Ok(Self {
            inner: Arc::new(client),
            authenticated: token.is_some(),
        })
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Check the configured token with one call to `/user`.
    ///
    /// Returns the login the token belongs to, or `None` when running
    /// unauthenticated (nothing to check).
    pub async fn verify(&self) -> platform::Result<Option<String>> {
        if !self.authenticated {
            return Ok(None);
        }

        let user: AuthenticatedUserDto = self.get("/user").await?;
        tracing::debug!(login = %user.login, "Verified GitHub token");
        Ok(Some(user.login))
    }

    async fn get<T: DeserializeOwned>(&self, route: &str) -> platform::Result<T> {
        self.inner
            .get(route, None::<&()>)
            .await
            .map_err(to_platform_error)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        route: &str,
        params: PageParams,
    ) -> platform::Result<Vec<T>> {
        self.inner
            .get(route, Some(&params))
            .await
            .map_err(to_platform_error)
    }
}

fn repo_route(owner: &str, name: &str, suffix: &str) -> String {
    format!("/repos/{owner}/{name}{suffix}")
}

#[async_trait]
impl ResourceFetcher for GitHubFetcher {
    async fn repository(&self, owner: &str, name: &str) -> platform::Result<RepoMetadata> {
        let repo: RepositoryDto = self.get(&repo_route(owner, name, "")).await?;
        Ok(to_repo_metadata(repo))
    }

    async fn languages(&self, owner: &str, name: &str) -> platform::Result<LanguageBytes> {
        let languages: LanguagesDto = self.get(&repo_route(owner, name, "/languages")).await?;
        Ok(languages)
    }

    async fn contributors(&self, owner: &str, name: &str) -> platform::Result<Vec<Contributor>> {
        let contributors: Vec<ContributorDto> = self
            .get_page(&repo_route(owner, name, "/contributors"), PageParams::first())
            .await?;
        Ok(contributors.into_iter().map(to_contributor).collect())
    }

    async fn branches(&self, owner: &str, name: &str) -> platform::Result<Vec<Branch>> {
        let branches: Vec<BranchDto> = self
            .get_page(&repo_route(owner, name, "/branches"), PageParams::first())
            .await?;
        Ok(branches.into_iter().map(to_branch).collect())
    }

    async fn forks(&self, owner: &str, name: &str) -> platform::Result<Vec<RepoMetadata>> {
        let forks: Vec<RepositoryDto> = self
            .get_page(&repo_route(owner, name, "/forks"), PageParams::first())
            .await?;
        Ok(forks.into_iter().map(to_repo_metadata).collect())
    }

    async fn license(&self, owner: &str, name: &str) -> platform::Result<LicenseInfo> {
        let content: LicenseContentDto = self.get(&repo_route(owner, name, "/license")).await?;
        Ok(to_license_info(content))
    }

    async fn participation(&self, owner: &str, name: &str) -> platform::Result<Participation> {
        let stats: ParticipationDto = self
            .get(&repo_route(owner, name, "/stats/participation"))
            .await?;
        Ok(to_participation(stats))
    }

    async fn releases(&self, owner: &str, name: &str) -> platform::Result<Vec<Release>> {
        let releases: Vec<ReleaseDto> = self
            .get_page(&repo_route(owner, name, "/releases"), PageParams::first())
            .await?;
        Ok(releases.into_iter().map(to_release).collect())
    }

    async fn org_repos(&self, org: &str) -> platform::Result<Vec<RepositoryIdentity>> {
        let route = format!("/orgs/{org}/repos");
        let mut params = PageParams::first();
        let mut identities = Vec::new();

        loop {
            let page: Vec<RepositoryDto> = self.get_page(&route, params).await?;
            let short_page = page.len() < PAGE_SIZE;
            identities.extend(page.into_iter().map(to_identity));

            if short_page {
                break;
            }
            params = params.next();
        }

        tracing::debug!(org, count = identities.len(), "Listed organization repositories");
        Ok(identities)
    }
}
