//! Test-only scripted fetcher.
//!
//! Every resource answers from an in-memory table. Individual resources can be
//! made to fail or to sleep before answering, which is how deadline and
//! partial-failure scenarios are exercised without any network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::target::RepositoryIdentity;

use super::errors::{PlatformError, Result};
use super::types::{
    Branch, Contributor, LanguageBytes, LicenseInfo, LicenseKind, Participation, Release,
    RepoMetadata, ResourceFetcher,
};

/// Resource kinds, used to inject failures and latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Repository,
    Languages,
    Contributors,
    Branches,
    Forks,
    License,
    Participation,
    Releases,
    OrgRepos,
}

/// Canned data for one repository.
#[derive(Debug, Clone, Default)]
pub struct MockRepo {
    pub metadata: RepoMetadata,
    pub languages: LanguageBytes,
    pub contributors: Vec<Contributor>,
    pub branches: Vec<Branch>,
    pub forks: Vec<RepoMetadata>,
    pub license: LicenseInfo,
    pub participation: Participation,
    pub releases: Vec<Release>,
}

#[derive(Clone, Default)]
pub struct MockFetcher {
    inner: Arc<Mutex<MockFetcherInner>>,
}

#[derive(Default)]
struct MockFetcherInner {
    repos: HashMap<String, MockRepo>,
    orgs: HashMap<String, Vec<RepositoryIdentity>>,
    failures: HashMap<Resource, PlatformError>,
    latency: HashMap<Resource, Duration>,
    calls: Vec<(Resource, String)>,
    in_flight: HashMap<Resource, usize>,
    peak: HashMap<Resource, usize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_repo(&self, repo: MockRepo) {
        let key = repo.metadata.full_name();
        self.lock().repos.insert(key, repo);
    }

    pub fn add_org(&self, org: &str, repos: Vec<RepositoryIdentity>) {
        self.lock().orgs.insert(org.to_string(), repos);
    }

    /// Make every call for `resource` fail with `error`.
    pub fn fail(&self, resource: Resource, error: PlatformError) {
        self.lock().failures.insert(resource, error);
    }

    /// Make every call for `resource` sleep before answering.
    pub fn delay(&self, resource: Resource, latency: Duration) {
        self.lock().latency.insert(resource, latency);
    }

    /// Calls made so far, as (resource, target) pairs.
    pub fn calls(&self) -> Vec<(Resource, String)> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, resource: Resource) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(r, _)| *r == resource)
            .count()
    }

    /// Most calls for `resource` that were ever in flight at once.
    pub fn peak_in_flight(&self, resource: Resource) -> usize {
        self.lock().peak.get(&resource).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockFetcherInner> {
        self.inner
            .lock()
            .expect("mock fetcher lock should not be poisoned")
    }

    async fn answer<T>(
        &self,
        resource: Resource,
        target: String,
        pick: impl FnOnce(&MockFetcherInner) -> Option<T>,
    ) -> Result<T> {
        let latency = {
            let mut inner = self.lock();
            inner.calls.push((resource, target.clone()));
            let in_flight = inner.in_flight.entry(resource).or_default();
            *in_flight += 1;
            let current = *in_flight;
            let peak = inner.peak.entry(resource).or_default();
            *peak = (*peak).max(current);
            inner.latency.get(&resource).copied()
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.lock();
        if let Some(in_flight) = inner.in_flight.get_mut(&resource) {
            *in_flight -= 1;
        }
        if let Some(err) = inner.failures.get(&resource) {
            return Err(err.clone());
        }
        pick(&*inner).ok_or_else(|| PlatformError::not_found(target))
    }

    async fn answer_repo<T>(
        &self,
        resource: Resource,
        owner: &str,
        name: &str,
        pick: impl FnOnce(&MockRepo) -> T,
    ) -> Result<T> {
        let key = format!("{owner}/{name}");
        self.answer(resource, key.clone(), |inner| inner.repos.get(&key).map(pick))
            .await
    }
}

#[async_trait]
impl ResourceFetcher for MockFetcher {
    async fn repository(&self, owner: &str, name: &str) -> Result<RepoMetadata> {
        self.answer_repo(Resource::Repository, owner, name, |r| r.metadata.clone())
            .await
    }

    async fn languages(&self, owner: &str, name: &str) -> Result<LanguageBytes> {
        self.answer_repo(Resource::Languages, owner, name, |r| r.languages.clone())
            .await
    }

    async fn contributors(&self, owner: &str, name: &str) -> Result<Vec<Contributor>> {
        self.answer_repo(Resource::Contributors, owner, name, |r| {
            r.contributors.clone()
        })
        .await
    }

    async fn branches(&self, owner: &str, name: &str) -> Result<Vec<Branch>> {
        self.answer_repo(Resource::Branches, owner, name, |r| r.branches.clone())
            .await
    }

    async fn forks(&self, owner: &str, name: &str) -> Result<Vec<RepoMetadata>> {
        self.answer_repo(Resource::Forks, owner, name, |r| r.forks.clone())
            .await
    }

    async fn license(&self, owner: &str, name: &str) -> Result<LicenseInfo> {
        self.answer_repo(Resource::License, owner, name, |r| r.license.clone())
            .await
    }

    async fn participation(&self, owner: &str, name: &str) -> Result<Participation> {
        self.answer_repo(Resource::Participation, owner, name, |r| {
            r.participation.clone()
        })
        .await
    }

    async fn releases(&self, owner: &str, name: &str) -> Result<Vec<Release>> {
        self.answer_repo(Resource::Releases, owner, name, |r| r.releases.clone())
            .await
    }

    async fn org_repos(&self, org: &str) -> Result<Vec<RepositoryIdentity>> {
        self.answer(Resource::OrgRepos, org.to_string(), |inner| {
            inner.orgs.get(org).cloned()
        })
        .await
    }
}

/// A fully populated repository for tests.
pub fn sample_repo(owner: &str, name: &str) -> MockRepo {
    MockRepo {
        metadata: RepoMetadata {
            owner: owner.to_string(),
            name: name.to_string(),
            stargazers: 80,
            forks: 2,
            watchers: 80,
            open_issues: 3,
            subscribers: 7,
            network: 2,
            size: 108,
        },
        languages: LanguageBytes::from([
            ("Rust".to_string(), 750),
            ("Shell".to_string(), 250),
        ]),
        contributors: vec![
            Contributor {
                login: "alice".to_string(),
                contributions: 40,
            },
            Contributor {
                login: "bob".to_string(),
                contributions: 2,
            },
        ],
        branches: vec![Branch {
            name: "main".to_string(),
            sha: "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d".to_string(),
        }],
        forks: vec![RepoMetadata {
            owner: "forker".to_string(),
            name: name.to_string(),
            stargazers: 1,
            size: 108,
            ..RepoMetadata::default()
        }],
        license: LicenseInfo {
            path: "LICENSE".to_string(),
            sha: "c9f8d1b1".to_string(),
            license: Some(LicenseKind {
                key: "mit".to_string(),
                name: "MIT License".to_string(),
                spdx_id: Some("MIT".to_string()),
            }),
        },
        participation: Participation {
            all: vec![3, 0, 5],
            owner: vec![1, 0, 2],
        },
        releases: vec![
            Release {
                id: 1,
                name: "v0.1.0".to_string(),
                asset_downloads: vec![10, 5],
            },
            Release {
                id: 2,
                name: "v0.2.0".to_string(),
                asset_downloads: vec![],
            },
        ],
    }
}
