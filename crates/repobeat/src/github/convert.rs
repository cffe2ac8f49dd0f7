//! Conversion from GitHub wire types to platform types.

use super::types::{
    BranchDto, ContributorDto, LicenseContentDto, ParticipationDto, ReleaseDto, RepositoryDto,
};
use crate::platform::{
    Branch, Contributor, LicenseInfo, LicenseKind, Participation, Release, RepoMetadata,
};
use crate::target::RepositoryIdentity;

pub fn to_repo_metadata(repo: RepositoryDto) -> RepoMetadata {
    RepoMetadata {
        owner: repo.owner.login,
        name: repo.name,
        stargazers: repo.stargazers_count,
        forks: repo.forks_count,
        watchers: repo.watchers_count,
        open_issues: repo.open_issues_count,
        subscribers: repo.subscribers_count.unwrap_or(0),
        network: repo.network_count.unwrap_or(0),
        size: repo.size,
    }
}

pub fn to_identity(repo: RepositoryDto) -> RepositoryIdentity {
    RepositoryIdentity::new(repo.owner.login, repo.name)
}

pub fn to_contributor(contributor: ContributorDto) -> Contributor {
    Contributor {
        login: contributor.login.unwrap_or_default(),
        contributions: contributor.contributions,
    }
}

pub fn to_branch(branch: BranchDto) -> Branch {
    Branch {
        name: branch.name,
        sha: branch.commit.sha,
    }
}

pub fn to_license_info(content: LicenseContentDto) -> LicenseInfo {
    LicenseInfo {
        path: content.path,
        sha: content.sha,
        license: content.license.map(|kind| LicenseKind {
            key: kind.key,
            name: kind.name,
            spdx_id: kind.spdx_id,
        }),
    }
}

pub fn to_participation(stats: ParticipationDto) -> Participation {
    Participation {
        all: stats.all,
        owner: stats.owner,
    }
}

/// Releases without a title fall back to their tag.
pub fn to_release(release: ReleaseDto) -> Release {
    let name = release
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or(release.tag_name);

    Release {
        id: release.id,
        name,
        asset_downloads: release
            .assets
            .into_iter()
            .map(|asset| asset.download_count)
            .collect(),
    }
}
