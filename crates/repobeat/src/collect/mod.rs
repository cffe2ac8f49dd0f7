//! The collection engine.
//!
//! One pass of the pipeline resolves configured targets into repositories,
//! aggregates each repository into an [`Event`](crate::event::Event), and
//! publishes it. The [`Scheduler`] repeats passes on a fixed period.
//!
//! # Module Structure
//!
//! - [`types`] - Options, results, constants: `CollectOptions`, `CycleReport`
//! - [`progress`] - Progress reporting: `CollectProgress`, `ProgressCallback`, `emit()`
//! - [`cycle`] - The deadline- and cancellation-bounded scope of one pass
//! - [`resolve`] - Target resolution: `resolve_targets()`
//! - [`aggregate`] - Per-repository aggregation: `aggregate_repository()`
//! - [`scheduler`] - Periodic driver: `Scheduler`, `run_cycle()`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use repobeat::collect::{CollectOptions, Scheduler};
//! use repobeat::sink::LogSink;
//! use repobeat::target::TargetList;
//! use tokio_util::sync::CancellationToken;
//!
//! let targets = TargetList::from_mixed(["octocat/Hello-World", "rust-lang"]);
//! let scheduler = Scheduler::new(fetcher, Arc::new(LogSink), targets, CollectOptions::default())?;
//! scheduler.run(CancellationToken::new()).await;
//! ```

pub mod aggregate;
pub mod cycle;
mod progress;
pub mod resolve;
pub mod scheduler;
mod types;

pub use types::{
    CollectError, CollectOptions, CycleReport, PartialEventPolicy, Resolution,
};

pub use types::{DEFAULT_CONCURRENCY, DEFAULT_JOB_TIMEOUT, DEFAULT_PERIOD};

pub use progress::{CollectProgress, ProgressCallback, emit};

pub use aggregate::{Aggregated, RepoOutcome, aggregate_repository, collect_repository};
pub use cycle::Cycle;
pub use resolve::resolve_targets;
pub use scheduler::{Scheduler, run_cycle};
