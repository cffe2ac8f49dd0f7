//! Integration tests for collection cycles.
//!
//! These tests drive the public collection API against a scripted fetcher and
//! make sure cycles finish within their deadlines and never hang.
//!
//! Key scenarios tested:
//! - A failing section degrades only that section
//! - A slow section is cut off by the cycle deadline on its own
//! - Target resolution tolerates malformed targets and failed organizations
//! - The scheduler stops promptly while a pass is still in flight
//! - Events flow through the channel sink to newline-delimited JSON

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use repobeat::collect::{
    CollectOptions, Cycle, PartialEventPolicy, RepoOutcome, Scheduler, aggregate_repository,
    collect_repository, resolve_targets,
};
use repobeat::event::Event;
use repobeat::platform::{
    Branch, Contributor, LanguageBytes, LicenseInfo, LicenseKind, Participation, PlatformError,
    Release, RepoMetadata, ResourceFetcher,
};
use repobeat::sink::{ChannelSink, EventSink, spawn_json_lines_writer};
use repobeat::target::{RepositoryIdentity, TargetList};
use tokio_util::sync::CancellationToken;

/// Maximum time any collection scenario should take.
/// If exceeded, there's likely a hang.
const CYCLE_TIMEOUT: Duration = Duration::from_secs(10);

// ─── Scripted Fetcher ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Script {
    repos: HashMap<String, RepoMetadata>,
    orgs: HashMap<String, Vec<RepositoryIdentity>>,
    failing: HashSet<&'static str>,
    slow: HashMap<&'static str, Duration>,
}

#[derive(Clone, Default)]
struct ScriptedFetcher {
    script: Arc<Mutex<Script>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    fn with_repo(owner: &str, name: &str) -> Self {
        let fetcher = Self::default();
        fetcher.add_repo(owner, name);
        fetcher
    }

    fn add_repo(&self, owner: &str, name: &str) {
        let metadata = RepoMetadata {
            owner: owner.to_string(),
            name: name.to_string(),
            stargazers: 42,
            forks: 1,
            watchers: 42,
            open_issues: 2,
            subscribers: 5,
            network: 1,
            size: 512,
        };
        self.script
            .lock()
            .unwrap()
            .repos
            .insert(format!("{owner}/{name}"), metadata);
    }

    fn add_org(&self, org: &str, repos: &[(&str, &str)]) {
        let identities = repos
            .iter()
            .map(|(owner, name)| RepositoryIdentity::new(*owner, *name))
            .collect();
        self.script
            .lock()
            .unwrap()
            .orgs
            .insert(org.to_string(), identities);
    }

    fn fail(&self, resource: &'static str) {
        self.script.lock().unwrap().failing.insert(resource);
    }

    fn slow(&self, resource: &'static str, latency: Duration) {
        self.script.lock().unwrap().slow.insert(resource, latency);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn step(
        &self,
        resource: &'static str,
        owner: &str,
        name: &str,
    ) -> Result<RepoMetadata, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.script.lock().unwrap().slow.get(resource).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let script = self.script.lock().unwrap();
        if script.failing.contains(resource) {
            return Err(PlatformError::api(format!("{resource} unavailable")));
        }
        script
            .repos
            .get(&format!("{owner}/{name}"))
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("{owner}/{name}")))
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn repository(&self, owner: &str, name: &str) -> Result<RepoMetadata, PlatformError> {
        self.step("repository", owner, name).await
    }

    async fn languages(&self, owner: &str, name: &str) -> Result<LanguageBytes, PlatformError> {
        self.step("languages", owner, name).await?;
        Ok(LanguageBytes::from([
            ("Go".to_string(), 600),
            ("Rust".to_string(), 400),
        ]))
    }

    async fn contributors(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<Contributor>, PlatformError> {
        self.step("contributors", owner, name).await?;
        Ok(vec![Contributor {
            login: "octocat".to_string(),
            contributions: 7,
        }])
    }

    async fn branches(&self, owner: &str, name: &str) -> Result<Vec<Branch>, PlatformError> {
        self.step("branches", owner, name).await?;
        Ok(vec![Branch {
            name: "main".to_string(),
            sha: "deadbeef".to_string(),
        }])
    }

    async fn forks(&self, owner: &str, name: &str) -> Result<Vec<RepoMetadata>, PlatformError> {
        let base = self.step("forks", owner, name).await?;
        Ok(vec![RepoMetadata {
            owner: "someone".to_string(),
            ..base
        }])
    }

    async fn license(&self, owner: &str, name: &str) -> Result<LicenseInfo, PlatformError> {
        self.step("license", owner, name).await?;
        Ok(LicenseInfo {
            path: "LICENSE".to_string(),
            sha: "0123abcd".to_string(),
            license: Some(LicenseKind {
                key: "apache-2.0".to_string(),
                name: "Apache License 2.0".to_string(),
                spdx_id: Some("Apache-2.0".to_string()),
            }),
        })
    }

    async fn participation(&self, owner: &str, name: &str) -> Result<Participation, PlatformError> {
        self.step("participation", owner, name).await?;
        Ok(Participation {
            all: vec![10, 20],
            owner: vec![5, 5],
        })
    }

    async fn releases(&self, owner: &str, name: &str) -> Result<Vec<Release>, PlatformError> {
        self.step("releases", owner, name).await?;
        Ok(vec![Release {
            id: 3,
            name: "v3".to_string(),
            asset_downloads: vec![100, 23],
        }])
    }

    async fn org_repos(&self, org: &str) -> Result<Vec<RepositoryIdentity>, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .orgs
            .get(org)
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("org: {org}")))
    }
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<Event>>,
}

impl CollectingSink {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn publish(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

fn hello_world() -> RepositoryIdentity {
    RepositoryIdentity::new("octocat", "Hello-World")
}

fn options(job_timeout: Duration) -> CollectOptions {
    CollectOptions {
        period: Duration::from_secs(60),
        job_timeout,
        ..CollectOptions::default()
    }
}

// ─── Aggregation Tests ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_license_failure_leaves_other_sections_intact() {
    let fetcher = ScriptedFetcher::with_repo("octocat", "Hello-World");
    fetcher.fail("license");
    let cycle = Cycle::new(1, &CancellationToken::new(), Duration::from_secs(5));

    let aggregated = tokio::time::timeout(
        CYCLE_TIMEOUT,
        aggregate_repository(&fetcher, &cycle, &hello_world()),
    )
    .await
    .expect("aggregation should not hang")
    .expect("base fetch should succeed");
    let event = aggregated.event;

    assert_eq!(
        event.license.error.as_deref(),
        Some("API error: license unavailable")
    );
    assert!(event.license.key.is_none());
    assert!(event.fork_list.error.is_none());
    assert_eq!(event.fork_list.items[0].owner, "someone");
    assert_eq!(event.contributor_list.items[0].contributions, 7);
    assert_eq!(event.branch_list.items[0].sha, "deadbeef");
    assert_eq!(event.languages.items[0].lang, "Go");
    assert_eq!(event.languages.items[0].ratio, Some(0.6));
    assert_eq!(event.participation.community, 20);
    assert_eq!(event.downloads.total_downloads, 123);
}

#[tokio::test]
async fn test_deadline_cuts_off_only_the_slow_section() {
    let fetcher = ScriptedFetcher::with_repo("octocat", "Hello-World");
    fetcher.slow("participation", Duration::from_secs(30));
    let cycle = Cycle::new(1, &CancellationToken::new(), Duration::from_millis(300));

    let aggregated = tokio::time::timeout(
        CYCLE_TIMEOUT,
        aggregate_repository(&fetcher, &cycle, &hello_world()),
    )
    .await
    .expect("deadline should end the slow fetch")
    .unwrap();
    let event = aggregated.event;

    assert!(aggregated.interrupted);
    assert_eq!(event.section_errors().len(), 1);
    assert!(
        event
            .participation
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Deadline exceeded"))
    );
    assert_eq!(event.participation.all, 0);
    assert_eq!(event.license.spdx_id.as_deref(), Some("Apache-2.0"));
    assert_eq!(event.downloads.total_downloads, 123);
}

#[tokio::test]
async fn test_drop_policy_discards_interrupted_event() {
    let fetcher = ScriptedFetcher::with_repo("octocat", "Hello-World");
    fetcher.slow("branches", Duration::from_secs(30));
    let sink = CollectingSink::default();
    let cycle = Cycle::new(1, &CancellationToken::new(), Duration::from_millis(200));

    let outcome = tokio::time::timeout(
        CYCLE_TIMEOUT,
        collect_repository(&fetcher, &sink, &cycle, &hello_world(), PartialEventPolicy::Drop),
    )
    .await
    .unwrap();

    assert_eq!(outcome, RepoOutcome::Discarded);
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_cancelled_cycle_issues_no_fetches() {
    let fetcher = ScriptedFetcher::with_repo("octocat", "Hello-World");
    let root = CancellationToken::new();
    let cycle = Cycle::new(1, &root, Duration::from_secs(5));
    root.cancel();

    let result = aggregate_repository(&fetcher, &cycle, &hello_world()).await;

    assert_eq!(result.unwrap_err(), PlatformError::Cancelled);
    assert_eq!(fetcher.calls(), 0);
}

// ─── Resolution Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_resolution_skips_bad_targets_and_failed_orgs() {
    let fetcher = ScriptedFetcher::default();
    fetcher.add_org("rust-lang", &[("rust-lang", "rust"), ("rust-lang", "cargo")]);
    let cycle = Cycle::new(1, &CancellationToken::new(), Duration::from_secs(5));

    let targets = TargetList::from_mixed([
        "octocat/Hello-World",
        "badformat/",
        "rust-lang",
        "no-such-org",
    ]);
    let resolution = tokio::time::timeout(
        CYCLE_TIMEOUT,
        resolve_targets(&fetcher, &cycle, &targets, None),
    )
    .await
    .unwrap();

    let mut names: Vec<String> = resolution
        .repositories
        .iter()
        .map(RepositoryIdentity::full_name)
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["octocat/Hello-World", "rust-lang/cargo", "rust-lang/rust"]
    );
    assert_eq!(resolution.rejected.len(), 1);
    assert_eq!(resolution.rejected[0].input(), "badformat/");
    assert_eq!(resolution.failed_orgs.len(), 1);
    assert_eq!(resolution.failed_orgs[0].0, "no-such-org");
}

// ─── Scheduler Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_once_writes_json_lines() {
    let fetcher = ScriptedFetcher::with_repo("octocat", "Hello-World");
    fetcher.add_repo("octocat", "Spoon-Knife");

    let (sink, rx) = ChannelSink::channel(8);
    let (client, mut server) = tokio::io::duplex(256 * 1024);
    let writer = spawn_json_lines_writer(rx, client);

    let scheduler = Scheduler::new(
        fetcher,
        Arc::new(sink),
        TargetList::from_mixed(["octocat/Hello-World", "octocat/Spoon-Knife"]),
        options(Duration::from_secs(5)),
    )
    .unwrap();

    let report = tokio::time::timeout(
        CYCLE_TIMEOUT,
        scheduler.run_once(&CancellationToken::new()),
    )
    .await
    .unwrap();
    assert_eq!(report.published, 2);
    drop(scheduler);

    let written = tokio::time::timeout(CYCLE_TIMEOUT, writer)
        .await
        .expect("writer should finish once the sink is dropped")
        .unwrap()
        .unwrap();
    assert_eq!(written, 2);

    let mut output = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut server, &mut output)
        .await
        .unwrap();

    let mut repos = Vec::new();
    for line in output.lines() {
        let json: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(json["type"], "repobeat");
        assert_eq!(json["stargazers"], 42);
        assert_eq!(json["participation"]["period"], "year");
        repos.push(json["repo"].as_str().unwrap().to_string());
    }
    repos.sort();
    assert_eq!(repos, vec!["Hello-World", "Spoon-Knife"]);
}

#[tokio::test]
async fn test_repeated_cycles_produce_equal_events() {
    let fetcher = ScriptedFetcher::with_repo("octocat", "Hello-World");
    let sink = Arc::new(CollectingSink::default());

    let scheduler = Scheduler::new(
        fetcher,
        Arc::clone(&sink),
        TargetList::from_mixed(["octocat/Hello-World"]),
        options(Duration::from_secs(5)),
    )
    .unwrap();

    let stop = CancellationToken::new();
    scheduler.run_once(&stop).await;
    scheduler.run_once(&stop).await;

    let events = sink.events();
    assert_eq!(events.len(), 2);

    let mut second = events[1].clone();
    second.timestamp = events[0].timestamp;
    assert_eq!(events[0], second);
}

#[tokio::test]
async fn test_scheduler_stops_without_waiting_for_pass() {
    let fetcher = ScriptedFetcher::with_repo("octocat", "Hello-World");
    fetcher.slow("repository", Duration::from_secs(60));
    let sink = Arc::new(CollectingSink::default());
    let stop = CancellationToken::new();

    let scheduler = Scheduler::new(
        fetcher.clone(),
        Arc::clone(&sink),
        TargetList::from_mixed(["octocat/Hello-World"]),
        CollectOptions {
            period: Duration::from_secs(60),
            job_timeout: Duration::from_secs(60),
            ..CollectOptions::default()
        },
    )
    .unwrap();
    let handle = tokio::spawn(scheduler.run(stop.clone()));

    // Wait for the first pass to reach the slow fetch.
    tokio::time::timeout(CYCLE_TIMEOUT, async {
        while fetcher.calls() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    stop.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler should return promptly after stop")
        .unwrap();

    assert!(sink.events().is_empty());
}
