//! Wire shapes of the GitHub REST responses the fetcher reads.
//!
//! Only the fields the collector uses are declared. Counts GitHub leaves out
//! of list responses default to zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Page size used for every list request.
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerDto {
    pub login: String,
}

/// A repository, as returned by `/repos/{owner}/{repo}` and list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryDto {
    pub name: String,
    pub owner: OwnerDto,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    /// Only present on the single-repository endpoint.
    #[serde(default)]
    pub subscribers_count: Option<u64>,
    /// Only present on the single-repository endpoint.
    #[serde(default)]
    pub network_count: Option<u64>,
    #[serde(default)]
    pub size: u64,
}

pub type LanguagesDto = BTreeMap<String, u64>;

#[derive(Debug, Clone, Deserialize)]
pub struct ContributorDto {
    /// Absent for anonymous contributors.
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub contributions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitRefDto {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchDto {
    pub name: String,
    pub commit: CommitRefDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LicenseKindDto {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub spdx_id: Option<String>,
}

/// Response of `/repos/{owner}/{repo}/license`.
#[derive(Debug, Clone, Deserialize)]
pub struct LicenseContentDto {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub license: Option<LicenseKindDto>,
}

/// Response of `/repos/{owner}/{repo}/stats/participation`.
///
/// GitHub answers `202 Accepted` with an empty object while it computes the
/// statistics, which decodes to two empty series.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipationDto {
    #[serde(default)]
    pub all: Vec<u64>,
    #[serde(default)]
    pub owner: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetDto {
    #[serde(default)]
    pub download_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDto {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<AssetDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUserDto {
    pub login: String,
}

/// Query parameters for list endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageParams {
    pub per_page: usize,
    pub page: u32,
}

impl PageParams {
    pub fn first() -> Self {
        Self {
            per_page: PAGE_SIZE,
            page: 1,
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }
}
