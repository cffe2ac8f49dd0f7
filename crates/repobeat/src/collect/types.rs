//! Collection options, results, and constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::PlatformError;
use crate::target::{RepositoryIdentity, TargetError};

/// Default time between cycles.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Default deadline for one cycle.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of repositories aggregated at once within a cycle.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// What to do with an event whose cycle was interrupted mid-aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialEventPolicy {
    /// Publish it; unfinished sections carry a cancellation error.
    #[default]
    Emit,
    /// Drop it.
    Drop,
}

/// Invalid collector options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    #[error("period must be greater than zero")]
    ZeroPeriod,

    #[error("job timeout must be greater than zero")]
    ZeroJobTimeout,

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Options for the collection scheduler.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Time between cycle starts.
    pub period: Duration,
    /// Deadline for each cycle, measured from its start.
    pub job_timeout: Duration,
    /// Maximum repositories aggregated concurrently within one cycle.
    pub concurrency: usize,
    /// Handling of events interrupted by the deadline or stop signal.
    pub partial_events: PartialEventPolicy,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            job_timeout: DEFAULT_JOB_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            partial_events: PartialEventPolicy::default(),
        }
    }
}

impl CollectOptions {
    /// Check that every duration and bound is usable.
    pub fn validate(&self) -> Result<(), CollectError> {
        if self.period.is_zero() {
            return Err(CollectError::ZeroPeriod);
        }
        if self.job_timeout.is_zero() {
            return Err(CollectError::ZeroJobTimeout);
        }
        if self.concurrency == 0 {
            return Err(CollectError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Flat list of repositories to aggregate, plus per-target failures.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Repositories to aggregate. Order is unspecified; duplicates pass through.
    pub repositories: Vec<RepositoryIdentity>,
    /// Malformed target strings.
    pub rejected: Vec<TargetError>,
    /// Organizations whose listing failed.
    pub failed_orgs: Vec<(String, PlatformError)>,
}

/// Result of one collection cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Cycle sequence number.
    pub cycle: u64,
    /// Number of repositories resolved.
    pub resolved: usize,
    /// Events handed to the sink.
    pub published: usize,
    /// Partial events dropped under [`PartialEventPolicy::Drop`].
    pub discarded: usize,
    /// Repositories whose base metadata fetch failed.
    pub failed: Vec<(RepositoryIdentity, PlatformError)>,
    /// Malformed target strings.
    pub rejected: Vec<TargetError>,
    /// Organizations whose listing failed.
    pub failed_orgs: Vec<(String, PlatformError)>,
    /// Whether the deadline or stop signal cut the cycle short.
    pub interrupted: bool,
    /// Wall time the cycle took.
    pub elapsed: Duration,
}
