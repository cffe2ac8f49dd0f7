use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::target::RepositoryIdentity;

use super::errors::Result;

/// Base metadata of a repository (platform-agnostic representation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMetadata {
    /// Owner login.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Star count.
    pub stargazers: u64,
    /// Fork count.
    pub forks: u64,
    /// Watcher count.
    pub watchers: u64,
    /// Open issue count (includes pull requests on GitHub).
    pub open_issues: u64,
    /// Subscriber count. Only returned by the single-repository endpoint.
    pub subscribers: u64,
    /// Network count. Only returned by the single-repository endpoint.
    pub network: u64,
    /// Size in KB.
    pub size: u64,
}

impl RepoMetadata {
    /// Get the full name (owner/name).
    #[inline]
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// The license detected for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseInfo {
    /// Path of the license file in the repository.
    pub path: String,
    /// Blob SHA of the license file.
    pub sha: String,
    /// Detected license, if the platform recognised one.
    pub license: Option<LicenseKind>,
}

/// A recognised license.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseKind {
    pub key: String,
    pub name: String,
    pub spdx_id: Option<String>,
}

/// A contributor and their commit count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
}

/// A branch and the SHA it points to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub sha: String,
}

/// Weekly commit counts over the trailing year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participation {
    /// Commits by everyone, one entry per week.
    pub all: Vec<u64>,
    /// Commits by the repository owner, one entry per week.
    pub owner: Vec<u64>,
}

/// A release and the download counts of its assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub name: String,
    /// Download count of each attached asset.
    pub asset_downloads: Vec<u64>,
}

/// Language name to byte count. Ordered so derived output is deterministic.
pub type LanguageBytes = BTreeMap<String, u64>;

/// Per-resource fetch interface over a code platform's API.
///
/// Each method is a thin pass-through to the platform: no retries, no
/// backoff, no caching. Cancellation is applied by the caller, which drops
/// the returned future when the cycle is stopped or times out.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch base repository metadata.
    async fn repository(&self, owner: &str, name: &str) -> Result<RepoMetadata>;

    /// Fetch language byte counts.
    async fn languages(&self, owner: &str, name: &str) -> Result<LanguageBytes>;

    /// List contributors.
    async fn contributors(&self, owner: &str, name: &str) -> Result<Vec<Contributor>>;

    /// List branches.
    async fn branches(&self, owner: &str, name: &str) -> Result<Vec<Branch>>;

    /// List forks, as base metadata.
    async fn forks(&self, owner: &str, name: &str) -> Result<Vec<RepoMetadata>>;

    /// Fetch the detected license.
    async fn license(&self, owner: &str, name: &str) -> Result<LicenseInfo>;

    /// Fetch weekly participation over the trailing year.
    async fn participation(&self, owner: &str, name: &str) -> Result<Participation>;

    /// List releases with asset download counts.
    async fn releases(&self, owner: &str, name: &str) -> Result<Vec<Release>>;

    /// List the repositories of an organization.
    async fn org_repos(&self, org: &str) -> Result<Vec<RepositoryIdentity>>;
}
