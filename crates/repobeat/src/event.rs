//! The structured record emitted for one repository in one cycle.
//!
//! An [`Event`] is the base repository metadata plus seven independently
//! fetched sections. Each section carries its own optional `error`: a failed
//! sub-fetch degrades one section, never the whole event.
//!
//! Serialized layout (JSON):
//!
//! ```text
//! {
//!   "@timestamp": "...", "type": "repobeat",
//!   "repo": "...", "owner": "...", "stargazers": 0, ..., "size": 0,
//!   "license":          { "path", "sha", "key"?, "name"?, "spdx_id"?, "error"? },
//!   "fork_list":        { "count", "items": [summary], "error"? },
//!   "contributor_list": { "count", "items": [{ "name", "contributions" }], "error"? },
//!   "branch_list":      { "count", "items": [{ "name", "sha" }], "error"? },
//!   "languages":        { "count", "items": [{ "lang", "bytes", "ratio"? }], "error"? },
//!   "participation":    { "all", "owner", "community", "period", "error"? },
//!   "downloads":        { "total_downloads", "releases": [...], "error"? }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::{
    Branch, Contributor, LanguageBytes, LicenseInfo, Participation, PlatformError, Release,
    RepoMetadata,
};

/// Record-type marker stamped on every event.
pub const RECORD_TYPE: &str = "repobeat";

/// Window covered by participation statistics.
pub const PARTICIPATION_PERIOD: &str = "year";

/// Outcome of one sub-fetch: a value (possibly empty) and an optional error.
#[derive(Debug, Clone, PartialEq)]
pub struct SubResult<T> {
    pub value: T,
    pub error: Option<PlatformError>,
}

impl<T: Default> SubResult<T> {
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    /// A failed sub-fetch; the value falls back to its empty default.
    pub fn failed(error: PlatformError) -> Self {
        Self {
            value: T::default(),
            error: Some(error),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

impl<T: Default> From<Result<T, PlatformError>> for SubResult<T> {
    fn from(result: Result<T, PlatformError>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(error) => Self::failed(error),
        }
    }
}

/// Base repository fields, shared by the event itself and each fork entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    #[serde(rename = "repo")]
    pub name: String,
    pub owner: String,
    pub stargazers: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub subscribers: u64,
    pub network: u64,
    pub size: u64,
}

impl From<&RepoMetadata> for RepoSummary {
    fn from(repo: &RepoMetadata) -> Self {
        Self {
            name: repo.name.clone(),
            owner: repo.owner.clone(),
            stargazers: repo.stargazers,
            forks: repo.forks,
            watchers: repo.watchers,
            open_issues: repo.open_issues,
            subscribers: repo.subscribers,
            network: repo.network,
            size: repo.size,
        }
    }
}

/// A list-shaped section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSection<T> {
    pub count: usize,
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ListSection<T> {
    pub fn new(items: Vec<T>, error: Option<String>) -> Self {
        Self {
            count: items.len(),
            items,
            error,
        }
    }
}

impl<T> Default for ListSection<T> {
    fn default() -> Self {
        Self::new(Vec::new(), None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSection {
    pub path: String,
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spdx_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorEntry {
    pub name: String,
    pub contributions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchEntry {
    pub name: String,
    pub sha: String,
}

/// One language's share of the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub lang: String,
    pub bytes: u64,
    /// `bytes / total bytes`; absent when the total is zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationSection {
    pub all: u64,
    pub owner: u64,
    /// `all - owner`.
    pub community: i64,
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for ParticipationSection {
    fn default() -> Self {
        participation_section(&Participation::default(), None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDownloads {
    pub id: u64,
    pub name: String,
    pub downloads: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadsSection {
    pub total_downloads: u64,
    pub releases: Vec<ReleaseDownloads>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw sub-fetch results for one repository, before derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sections {
    pub license: SubResult<LicenseInfo>,
    pub forks: SubResult<Vec<RepoMetadata>>,
    pub contributors: SubResult<Vec<Contributor>>,
    pub branches: SubResult<Vec<Branch>>,
    pub languages: SubResult<LanguageBytes>,
    pub participation: SubResult<Participation>,
    pub releases: SubResult<Vec<Release>>,
}

impl Sections {
    /// Section names paired with their errors, in event field order.
    pub fn errors(&self) -> Vec<(&'static str, &PlatformError)> {
        [
            ("license", self.license.error.as_ref()),
            ("fork_list", self.forks.error.as_ref()),
            ("contributor_list", self.contributors.error.as_ref()),
            ("branch_list", self.branches.error.as_ref()),
            ("languages", self.languages.error.as_ref()),
            ("participation", self.participation.error.as_ref()),
            ("downloads", self.releases.error.as_ref()),
        ]
        .into_iter()
        .filter_map(|(section, error)| error.map(|e| (section, e)))
        .collect()
    }

    /// Whether any section was cut short by cancellation or the deadline.
    pub fn interrupted(&self) -> bool {
        self.errors().iter().any(|(_, e)| e.is_cancellation())
    }
}

/// The complete record for one repository in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(flatten)]
    pub repo: RepoSummary,
    pub license: LicenseSection,
    pub fork_list: ListSection<RepoSummary>,
    pub contributor_list: ListSection<ContributorEntry>,
    pub branch_list: ListSection<BranchEntry>,
    pub languages: ListSection<LanguageShare>,
    pub participation: ParticipationSection,
    pub downloads: DownloadsSection,
}

impl Event {
    /// Merge base metadata and sub-fetch results into one event.
    pub fn assemble(base: &RepoMetadata, sections: &Sections, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            record_type: RECORD_TYPE.to_string(),
            repo: RepoSummary::from(base),
            license: license_section(&sections.license.value, sections.license.error_message()),
            fork_list: ListSection::new(
                sections.forks.value.iter().map(RepoSummary::from).collect(),
                sections.forks.error_message(),
            ),
            contributor_list: ListSection::new(
                sections
                    .contributors
                    .value
                    .iter()
                    .map(|c| ContributorEntry {
                        name: c.login.clone(),
                        contributions: c.contributions,
                    })
                    .collect(),
                sections.contributors.error_message(),
            ),
            branch_list: ListSection::new(
                sections
                    .branches
                    .value
                    .iter()
                    .map(|b| BranchEntry {
                        name: b.name.clone(),
                        sha: b.sha.clone(),
                    })
                    .collect(),
                sections.branches.error_message(),
            ),
            languages: ListSection::new(
                language_shares(&sections.languages.value),
                sections.languages.error_message(),
            ),
            participation: participation_section(
                &sections.participation.value,
                sections.participation.error_message(),
            ),
            downloads: downloads_section(
                &sections.releases.value,
                sections.releases.error_message(),
            ),
        }
    }

    /// Sections whose fetch failed, as (section, error message) pairs.
    pub fn section_errors(&self) -> Vec<(&'static str, &str)> {
        [
            ("license", self.license.error.as_deref()),
            ("fork_list", self.fork_list.error.as_deref()),
            ("contributor_list", self.contributor_list.error.as_deref()),
            ("branch_list", self.branch_list.error.as_deref()),
            ("languages", self.languages.error.as_deref()),
            ("participation", self.participation.error.as_deref()),
            ("downloads", self.downloads.error.as_deref()),
        ]
        .into_iter()
        .filter_map(|(section, error)| error.map(|e| (section, e)))
        .collect()
    }

    /// Get the full name (owner/repo).
    #[inline]
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.repo.owner, self.repo.name)
    }
}

fn license_section(info: &LicenseInfo, error: Option<String>) -> LicenseSection {
    let kind = info.license.as_ref();
    LicenseSection {
        path: info.path.clone(),
        sha: info.sha.clone(),
        key: kind.map(|k| k.key.clone()),
        name: kind.map(|k| k.name.clone()),
        spdx_id: kind.and_then(|k| k.spdx_id.clone()),
        error,
    }
}

/// Per-language byte counts with each language's share of the total.
///
/// An empty map yields no entries. A map whose total is zero yields entries
/// without a ratio rather than NaN.
pub fn language_shares(languages: &LanguageBytes) -> Vec<LanguageShare> {
    let total: u64 = languages.values().sum();

    languages
        .iter()
        .map(|(lang, &bytes)| LanguageShare {
            lang: lang.clone(),
            bytes,
            ratio: (total > 0).then(|| bytes as f64 / total as f64),
        })
        .collect()
}

/// Summed participation; both counts are zero when nothing was fetched.
pub fn participation_section(
    participation: &Participation,
    error: Option<String>,
) -> ParticipationSection {
    let all: u64 = participation.all.iter().sum();
    let owner: u64 = participation.owner.iter().sum();

    ParticipationSection {
        all,
        owner,
        community: all as i64 - owner as i64,
        period: PARTICIPATION_PERIOD.to_string(),
        error,
    }
}

/// Per-release download sums and their grand total.
pub fn downloads_section(releases: &[Release], error: Option<String>) -> DownloadsSection {
    let releases: Vec<ReleaseDownloads> = releases
        .iter()
        .map(|release| ReleaseDownloads {
            id: release.id,
            name: release.name.clone(),
            downloads: release.asset_downloads.iter().sum(),
        })
        .collect();

    DownloadsSection {
        total_downloads: releases.iter().map(|r| r.downloads).sum(),
        releases,
        error,
    }
}
