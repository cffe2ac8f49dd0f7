//! The bounded lifetime of one collection pass.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::platform::{PlatformError, Result};

/// Execution scope of one collection pass.
///
/// A cycle is derived from the scheduler's root token and carries its own
/// deadline. Every fetch made on behalf of the cycle goes through
/// [`Cycle::run`], which refuses to start once the cycle is over and resolves
/// early with [`PlatformError::Cancelled`] or
/// [`PlatformError::DeadlineExceeded`] when it ends mid-flight. Clones share
/// the same token and deadline.
#[derive(Debug, Clone)]
pub struct Cycle {
    id: u64,
    token: CancellationToken,
    deadline: Instant,
}

impl Cycle {
    /// Open a cycle under `parent` that expires `timeout` from now.
    pub fn new(id: u64, parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            id,
            token: parent.child_token(),
            deadline: Instant::now() + timeout,
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Ok while the cycle may still start work.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            Err(PlatformError::Cancelled)
        } else if Instant::now() >= self.deadline {
            Err(PlatformError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    /// Whether the stop signal or the deadline has ended the cycle.
    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.check().is_err()
    }

    /// Run `fut` within the cycle.
    ///
    /// `fut` is never polled if the cycle is already over, and is dropped as
    /// soon as the cycle is cancelled or its deadline passes.
    pub async fn run<T, Fut>(&self, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.check()?;

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(PlatformError::Cancelled),
            _ = sleep_until(self.deadline) => Err(PlatformError::DeadlineExceeded),
            result = fut => result,
        }
    }

    /// Tear the cycle down; work still in flight resolves as cancelled.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}
