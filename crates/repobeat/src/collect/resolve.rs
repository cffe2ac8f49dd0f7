//! Expansion of configured targets into repository identities.

use tokio::task::JoinSet;

use super::cycle::Cycle;
use super::progress::{CollectProgress, ProgressCallback, emit};
use super::types::Resolution;
use crate::platform::{PlatformError, ResourceFetcher, short_error_message};
use crate::target::{RepositoryIdentity, TargetList, parse_organization};

/// Resolve the configured targets into the repositories to collect this cycle.
///
/// Explicit repositories are parsed in place; a malformed entry is recorded in
/// [`Resolution::rejected`] and skipped. Organizations are listed concurrently,
/// one task each; an organization whose listing fails contributes nothing and
/// is recorded in [`Resolution::failed_orgs`]. Ordering of the result is
/// unspecified and duplicates are kept.
#[tracing::instrument(skip_all, fields(cycle = cycle.id()))]
pub async fn resolve_targets<F>(
    fetcher: &F,
    cycle: &Cycle,
    targets: &TargetList,
    on_progress: Option<&ProgressCallback>,
) -> Resolution
where
    F: ResourceFetcher + Clone + 'static,
{
    let mut resolution = Resolution::default();

    for raw in &targets.repos {
        match raw.parse::<RepositoryIdentity>() {
            Ok(identity) => resolution.repositories.push(identity),
            Err(e) => {
                emit(
                    on_progress,
                    CollectProgress::TargetRejected {
                        target: raw.clone(),
                        error: e.to_string(),
                    },
                );
                resolution.rejected.push(e);
            }
        }
    }

    let mut join_set: JoinSet<(String, Result<Vec<RepositoryIdentity>, PlatformError>)> =
        JoinSet::new();

    for raw in &targets.orgs {
        let org = match parse_organization(raw) {
            Ok(org) => org,
            Err(e) => {
                emit(
                    on_progress,
                    CollectProgress::TargetRejected {
                        target: raw.clone(),
                        error: e.to_string(),
                    },
                );
                resolution.rejected.push(e);
                continue;
            }
        };

        let fetcher = fetcher.clone();
        let cycle = cycle.clone();
        join_set.spawn(async move {
            let result = cycle.run(fetcher.org_repos(&org)).await;
            (org, result)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((org, Ok(repos))) => {
                tracing::debug!(org = %org, count = repos.len(), "Listed organization repositories");
                emit(
                    on_progress,
                    CollectProgress::OrgResolved {
                        org: org.clone(),
                        count: repos.len(),
                    },
                );
                resolution.repositories.extend(repos);
            }
            Ok((org, Err(e))) => {
                emit(
                    on_progress,
                    CollectProgress::OrgListingFailed {
                        org: org.clone(),
                        error: short_error_message(&e),
                    },
                );
                resolution.failed_orgs.push((org, e));
            }
            Err(e) => {
                tracing::error!(error = %e, "Organization listing task failed");
            }
        }
    }

    emit(
        on_progress,
        CollectProgress::TargetsResolved {
            repositories: resolution.repositories.len(),
            rejected: resolution.rejected.len(),
            failed_orgs: resolution.failed_orgs.len(),
        },
    );

    resolution
}
