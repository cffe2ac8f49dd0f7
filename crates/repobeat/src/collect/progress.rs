//! Progress reporting types for collection cycles.
//!
//! Every per-target failure the collector tolerates is surfaced here, so a
//! reporter can log it without the engine knowing how output is rendered.

/// Progress events emitted during a collection cycle.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum CollectProgress {
    /// A cycle began.
    CycleStarted {
        /// Cycle sequence number, starting at 1.
        cycle: u64,
        /// Number of configured targets (repositories + organizations).
        targets: usize,
    },

    /// A tick fired but no pass was started.
    CycleSkipped {
        cycle: u64,
        reason: String,
    },

    /// A configured target string was malformed and skipped.
    TargetRejected {
        /// The raw configured string.
        target: String,
        error: String,
    },

    /// Listing an organization's repositories failed; it contributes nothing.
    OrgListingFailed {
        org: String,
        error: String,
    },

    /// An organization's repositories were listed.
    OrgResolved {
        org: String,
        count: usize,
    },

    /// Target resolution finished.
    TargetsResolved {
        /// Repositories to aggregate this cycle.
        repositories: usize,
        /// Target strings rejected for their format.
        rejected: usize,
        /// Organizations whose listing failed.
        failed_orgs: usize,
    },

    /// The base metadata fetch failed; no event for this repository.
    RepositoryFailed {
        owner: String,
        name: String,
        error: String,
    },

    /// One section of an event could not be fetched.
    SectionFailed {
        owner: String,
        name: String,
        section: &'static str,
        error: String,
    },

    /// An event was handed to the sink.
    EventPublished {
        owner: String,
        name: String,
        /// Number of sections carrying an error.
        section_errors: usize,
    },

    /// A partial event was dropped because the cycle was interrupted.
    EventDiscarded {
        owner: String,
        name: String,
    },

    /// A cycle finished or was torn down.
    CycleComplete {
        cycle: u64,
        published: usize,
        failed: usize,
        discarded: usize,
        elapsed_ms: u64,
        /// Whether the cycle deadline or stop signal cut it short.
        interrupted: bool,
    },
}

/// Progress callback for collection operations.
pub type ProgressCallback = Box<dyn Fn(CollectProgress) + Send + Sync>;

/// Helper to emit progress if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: CollectProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
