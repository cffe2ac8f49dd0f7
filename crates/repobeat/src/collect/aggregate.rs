//! Per-repository aggregation: one base fetch, seven concurrent section
//! fetches, one merged [`Event`].

use chrono::Utc;

use super::cycle::Cycle;
use super::types::PartialEventPolicy;
use crate::event::{Event, Sections};
use crate::platform::{PlatformError, ResourceFetcher};
use crate::sink::EventSink;
use crate::target::RepositoryIdentity;

/// An event built for one repository.
#[derive(Debug, Clone)]
pub struct Aggregated {
    pub event: Event,
    /// Whether some section was cut short by the cycle ending.
    pub interrupted: bool,
}

/// What happened to one repository within a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoOutcome {
    /// An event went to the sink. Lists sections that carry an error.
    Published {
        section_errors: Vec<(&'static str, String)>,
    },
    /// A partial event was dropped under [`PartialEventPolicy::Drop`].
    Discarded,
    /// The base metadata fetch failed; no event was produced.
    Failed(PlatformError),
}

/// Run all section fetches for one repository concurrently.
///
/// Returns once every fetch has finished, failed, or been interrupted by the
/// cycle. Nothing spawned here outlives the call.
pub async fn fetch_sections<F>(fetcher: &F, cycle: &Cycle, owner: &str, name: &str) -> Sections
where
    F: ResourceFetcher + ?Sized,
{
    let (license, forks, contributors, branches, languages, participation, releases) = tokio::join!(
        cycle.run(fetcher.license(owner, name)),
        cycle.run(fetcher.forks(owner, name)),
        cycle.run(fetcher.contributors(owner, name)),
        cycle.run(fetcher.branches(owner, name)),
        cycle.run(fetcher.languages(owner, name)),
        cycle.run(fetcher.participation(owner, name)),
        cycle.run(fetcher.releases(owner, name)),
    );

    Sections {
        license: license.into(),
        forks: forks.into(),
        contributors: contributors.into(),
        branches: branches.into(),
        languages: languages.into(),
        participation: participation.into(),
        releases: releases.into(),
    }
}

/// Build the event for one repository.
///
/// A failed base metadata fetch aborts this repository only. Section failures
/// are recorded on the event and never fail the call.
#[tracing::instrument(skip_all, fields(cycle = cycle.id(), repo = %identity))]
pub async fn aggregate_repository<F>(
    fetcher: &F,
    cycle: &Cycle,
    identity: &RepositoryIdentity,
) -> Result<Aggregated, PlatformError>
where
    F: ResourceFetcher + ?Sized,
{
    let base = cycle
        .run(fetcher.repository(&identity.owner, &identity.name))
        .await?;

    let sections = fetch_sections(fetcher, cycle, &identity.owner, &identity.name).await;
    let interrupted = sections.interrupted();

    for (section, error) in sections.errors() {
        tracing::debug!(section, error = %error, "Section fetch failed");
    }

    Ok(Aggregated {
        event: Event::assemble(&base, &sections, Utc::now()),
        interrupted,
    })
}

/// Aggregate one repository and hand the result to `sink`.
pub async fn collect_repository<F, S>(
    fetcher: &F,
    sink: &S,
    cycle: &Cycle,
    identity: &RepositoryIdentity,
    policy: PartialEventPolicy,
) -> RepoOutcome
where
    F: ResourceFetcher + ?Sized,
    S: EventSink + ?Sized,
{
    let aggregated = match aggregate_repository(fetcher, cycle, identity).await {
        Ok(aggregated) => aggregated,
        Err(e) => {
            tracing::warn!(repo = %identity, error = %e, "Failed to fetch repository");
            return RepoOutcome::Failed(e);
        }
    };

    if aggregated.interrupted && policy == PartialEventPolicy::Drop {
        tracing::debug!(repo = %identity, "Discarding partial event");
        return RepoOutcome::Discarded;
    }

    let section_errors = aggregated
        .event
        .section_errors()
        .into_iter()
        .map(|(section, error)| (section, error.to_string()))
        .collect();

    sink.publish(aggregated.event).await;

    RepoOutcome::Published { section_errors }
}
