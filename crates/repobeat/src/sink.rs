//! Downstream delivery of finished events.
//!
//! The collector calls [`EventSink::publish`] once per completed event, from
//! many repository tasks at once. Delivery problems belong to the sink: they
//! are logged here and never reach the collection engine.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::event::Event;

/// Default capacity of the event channel.
pub const DEFAULT_SINK_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event channel closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives finished events. Must be safe to call concurrently.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: Event);
}

/// Sink that forwards events into a bounded channel.
///
/// Publishing waits for channel capacity, so a slow consumer applies
/// backpressure to the repository tasks instead of buffering without limit.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Event>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Send an event, reporting a closed channel to the caller.
    pub async fn try_publish(&self, event: Event) -> Result<(), SinkError> {
        self.tx.send(event).await.map_err(|_| SinkError::Closed)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn publish(&self, event: Event) {
        let repo = event.full_name();
        if let Err(e) = self.try_publish(event).await {
            tracing::warn!(repo = %repo, error = %e, "Dropping event");
        }
    }
}

/// Sink that only logs a one-line summary of each event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn publish(&self, event: Event) {
        tracing::info!(
            repo = %event.full_name(),
            stargazers = event.repo.stargazers,
            forks = event.repo.forks,
            open_issues = event.repo.open_issues,
            section_errors = event.section_errors().len(),
            "Collected repository"
        );
    }
}

/// Drain `rx` into `writer` as newline-delimited JSON.
///
/// The task finishes once every sender is dropped and returns the number of
/// events written. An event that fails to serialize is logged and skipped; an
/// I/O error ends the task.
pub fn spawn_json_lines_writer<W>(
    mut rx: mpsc::Receiver<Event>,
    mut writer: W,
) -> JoinHandle<Result<usize, SinkError>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut written = 0usize;

        while let Some(event) = rx.recv().await {
            let mut line = match serde_json::to_vec(&event) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(repo = %event.full_name(), error = %e, "Failed to serialize event");
                    continue;
                }
            };
            line.push(b'\n');

            writer.write_all(&line).await?;
            writer.flush().await?;
            written += 1;
        }

        writer.flush().await?;
        Ok::<_, SinkError>(written)
    })
}
