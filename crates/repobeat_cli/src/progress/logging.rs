use repobeat::collect::CollectProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: CollectProgress) {
        match event {
            CollectProgress::CycleStarted { cycle, targets } => {
                tracing::info!(cycle, targets, "Cycle started");
            }

            CollectProgress::CycleSkipped { cycle, reason } => {
                tracing::info!(cycle, reason = %reason, "Cycle skipped");
            }

            CollectProgress::TargetRejected { target, error } => {
                tracing::warn!(input = %target, error = %error, "Skipping malformed target");
            }

            CollectProgress::OrgListingFailed { org, error } => {
                tracing::warn!(org = %org, error = %error, "Failed to list organization repositories");
            }

            CollectProgress::OrgResolved { org, count } => {
                tracing::debug!(org = %org, count, "Resolved organization");
            }

            CollectProgress::TargetsResolved {
                repositories,
                rejected,
                failed_orgs,
            } => {
                tracing::debug!(repositories, rejected, failed_orgs, "Targets resolved");
            }

            CollectProgress::RepositoryFailed { owner, name, error } => {
                tracing::warn!(repo = %format!("{}/{}", owner, name), error = %error, "Failed to collect repository");
            }

            CollectProgress::SectionFailed {
                owner,
                name,
                section,
                error,
            } => {
                tracing::debug!(repo = %format!("{}/{}", owner, name), section, error = %error, "Section unavailable");
            }

            CollectProgress::EventPublished {
                owner,
                name,
                section_errors,
            } => {
                tracing::debug!(repo = %format!("{}/{}", owner, name), section_errors, "Published event");
            }

            CollectProgress::EventDiscarded { owner, name } => {
                tracing::info!(repo = %format!("{}/{}", owner, name), "Discarded partial event");
            }

            CollectProgress::CycleComplete {
                cycle,
                published,
                failed,
                discarded,
                elapsed_ms,
                interrupted,
            } => {
                if interrupted {
                    tracing::warn!(cycle, published, failed, discarded, elapsed_ms, "Cycle interrupted");
                } else {
                    tracing::info!(cycle, published, failed, discarded, elapsed_ms, "Cycle complete");
                }
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
