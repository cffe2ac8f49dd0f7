//! Repobeat - periodic repository statistics collection.
//!
//! On a fixed period this library resolves a configured set of repositories
//! and organizations, fetches each repository's statistics from the code
//! platform, merges them into one structured [`Event`] per repository, and
//! hands every event to an [`EventSink`].
//!
//! # Features
//!
//! - `github` (default) - Enables [`github::GitHubFetcher`], the octocrab-backed
//!   [`ResourceFetcher`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use repobeat::{CollectOptions, GitHubFetcher, LogSink, Scheduler, TargetList};
//! use tokio_util::sync::CancellationToken;
//!
//! let fetcher = GitHubFetcher::new(std::env::var("GITHUB_TOKEN").ok().as_deref(), None)?;
//! let targets = TargetList::from_mixed(["octocat/Hello-World"]);
//! let scheduler = Scheduler::new(fetcher, Arc::new(LogSink), targets, CollectOptions::default())?;
//! scheduler.run(CancellationToken::new()).await;
//! ```

pub mod collect;
pub mod event;
pub mod platform;
pub mod sink;
pub mod target;

#[cfg(feature = "github")]
pub mod github;

pub use collect::{CollectOptions, CollectProgress, CycleReport, PartialEventPolicy, Scheduler};
pub use event::Event;
#[cfg(feature = "github")]
pub use github::GitHubFetcher;
pub use platform::{PlatformError, ResourceFetcher};
pub use sink::{ChannelSink, EventSink, LogSink};
pub use target::{RepositoryIdentity, TargetList};
