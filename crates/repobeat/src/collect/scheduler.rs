//! Periodic driver for collection cycles.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::aggregate::{RepoOutcome, collect_repository};
use super::cycle::Cycle;
use super::progress::{CollectProgress, ProgressCallback, emit};
use super::resolve::resolve_targets;
use super::types::{CollectError, CollectOptions, CycleReport};
use crate::platform::{PlatformError, ResourceFetcher, short_error_message};
use crate::sink::EventSink;
use crate::target::{RepositoryIdentity, TargetList};

/// Run one complete collection pass.
///
/// Resolves `targets`, aggregates every resolved repository with at most
/// `options.concurrency` in flight, and publishes each event to `sink`. Every
/// fetch is bounded by `cycle`; per-target failures are reported and never end
/// the pass early. The cycle is cancelled on return so nothing started on its
/// behalf keeps running.
#[tracing::instrument(skip_all, fields(cycle = cycle.id()))]
pub async fn run_cycle<F, S>(
    fetcher: &F,
    sink: &Arc<S>,
    targets: &TargetList,
    options: &CollectOptions,
    cycle: Cycle,
    on_progress: Option<&ProgressCallback>,
) -> CycleReport
where
    F: ResourceFetcher + Clone + 'static,
    S: EventSink + ?Sized + 'static,
{
    let started = Instant::now();
    let mut report = CycleReport {
        cycle: cycle.id(),
        ..CycleReport::default()
    };

    emit(
        on_progress,
        CollectProgress::CycleStarted {
            cycle: cycle.id(),
            targets: targets.len(),
        },
    );

    if let Err(e) = cycle.check() {
        emit(
            on_progress,
            CollectProgress::CycleSkipped {
                cycle: cycle.id(),
                reason: e.to_string(),
            },
        );
        report.interrupted = true;
        return report;
    }

    let resolution = resolve_targets(fetcher, &cycle, targets, on_progress).await;
    report.resolved = resolution.repositories.len();
    report.rejected = resolution.rejected;
    report.failed_orgs = resolution.failed_orgs;

    let semaphore = Arc::new(Semaphore::new(options.concurrency));
    let mut join_set: JoinSet<(RepositoryIdentity, RepoOutcome)> = JoinSet::new();

    for identity in resolution.repositories {
        let fetcher = fetcher.clone();
        let sink = Arc::clone(sink);
        let semaphore = Arc::clone(&semaphore);
        let cycle = cycle.clone();
        let policy = options.partial_events;

        join_set.spawn(async move {
            let permit = cycle
                .run(async {
                    semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| PlatformError::internal("Semaphore closed unexpectedly"))
                })
                .await;

            let outcome = match permit {
                Ok(_permit) => {
                    collect_repository(&fetcher, sink.as_ref(), &cycle, &identity, policy).await
                }
                Err(e) => RepoOutcome::Failed(e),
            };

            (identity, outcome)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((identity, RepoOutcome::Published { section_errors })) => {
                report.published += 1;
                for (section, error) in &section_errors {
                    emit(
                        on_progress,
                        CollectProgress::SectionFailed {
                            owner: identity.owner.clone(),
                            name: identity.name.clone(),
                            section: *section,
                            error: error.clone(),
                        },
                    );
                }
                emit(
                    on_progress,
                    CollectProgress::EventPublished {
                        owner: identity.owner,
                        name: identity.name,
                        section_errors: section_errors.len(),
                    },
                );
            }
            Ok((identity, RepoOutcome::Discarded)) => {
                report.discarded += 1;
                emit(
                    on_progress,
                    CollectProgress::EventDiscarded {
                        owner: identity.owner,
                        name: identity.name,
                    },
                );
            }
            Ok((identity, RepoOutcome::Failed(e))) => {
                emit(
                    on_progress,
                    CollectProgress::RepositoryFailed {
                        owner: identity.owner.clone(),
                        name: identity.name.clone(),
                        error: short_error_message(&e),
                    },
                );
                report.failed.push((identity, e));
            }
            Err(e) => {
                tracing::error!(error = %e, "Repository task failed");
            }
        }
    }

    report.interrupted = cycle.is_interrupted();
    cycle.cancel();
    report.elapsed = started.elapsed();

    emit(
        on_progress,
        CollectProgress::CycleComplete {
            cycle: report.cycle,
            published: report.published,
            failed: report.failed.len(),
            discarded: report.discarded,
            elapsed_ms: report.elapsed.as_millis() as u64,
            interrupted: report.interrupted,
        },
    );

    report
}

/// Fires a collection pass on every period tick until stopped.
///
/// Each pass gets its own [`Cycle`] derived from the stop token, so a pass
/// abandoned by its deadline is never resumed by the next one. A pass that
/// outlives the period does not delay the next tick.
pub struct Scheduler<F, S: ?Sized> {
    fetcher: F,
    sink: Arc<S>,
    targets: Arc<TargetList>,
    options: CollectOptions,
    on_progress: Option<Arc<ProgressCallback>>,
}

impl<F, S> Scheduler<F, S>
where
    F: ResourceFetcher + Clone + 'static,
    S: EventSink + ?Sized + 'static,
{
    pub fn new(
        fetcher: F,
        sink: Arc<S>,
        targets: TargetList,
        options: CollectOptions,
    ) -> Result<Self, CollectError> {
        options.validate()?;

        if options.job_timeout > options.period {
            tracing::warn!(
                period_secs = options.period.as_secs_f64(),
                job_timeout_secs = options.job_timeout.as_secs_f64(),
                "Job timeout exceeds the period; passes may overlap"
            );
        }

        Ok(Self {
            fetcher,
            sink,
            targets: Arc::new(targets),
            options,
            on_progress: None,
        })
    }

    /// Report progress of every cycle to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Run a single pass under `stop` and wait for it to finish.
    pub async fn run_once(&self, stop: &CancellationToken) -> CycleReport {
        let cycle = Cycle::new(1, stop, self.options.job_timeout);
        run_cycle(
            &self.fetcher,
            &self.sink,
            &self.targets,
            &self.options,
            cycle,
            self.on_progress.as_deref(),
        )
        .await
    }

    /// Tick until `stop` is cancelled.
    ///
    /// The first pass starts immediately. On stop, passes still in flight see
    /// their cycle cancelled and are left to wind down on their own; this
    /// returns without waiting for them.
    pub async fn run(self, stop: CancellationToken) {
        let mut interval = tokio::time::interval(self.options.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut passes: JoinSet<CycleReport> = JoinSet::new();
        let mut next_cycle = 0u64;

        tracing::info!(
            period_secs = self.options.period.as_secs_f64(),
            job_timeout_secs = self.options.job_timeout.as_secs_f64(),
            targets = self.targets.len(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = interval.tick() => {
                    next_cycle += 1;
                    let cycle = Cycle::new(next_cycle, &stop, self.options.job_timeout);
                    self.spawn_pass(&mut passes, cycle);
                }
                Some(joined) = passes.join_next(), if !passes.is_empty() => {
                    match joined {
                        Ok(report) => tracing::debug!(
                            cycle = report.cycle,
                            published = report.published,
                            "Pass finished"
                        ),
                        Err(e) => tracing::error!(error = %e, "Collection pass failed"),
                    }
                }
            }
        }

        tracing::info!(in_flight = passes.len(), "Scheduler stopped");
        passes.detach_all();
    }

    fn spawn_pass(&self, passes: &mut JoinSet<CycleReport>, cycle: Cycle) {
        let fetcher = self.fetcher.clone();
        let sink = Arc::clone(&self.sink);
        let targets = Arc::clone(&self.targets);
        let options = self.options.clone();
        let on_progress = self.on_progress.clone();

        passes.spawn(async move {
            run_cycle(
                &fetcher,
                &sink,
                &targets,
                &options,
                cycle,
                on_progress.as_deref(),
            )
            .await
        });
    }
}
