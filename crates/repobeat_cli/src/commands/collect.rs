use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use repobeat::collect::{CycleReport, Scheduler};
use repobeat::github::GitHubFetcher;
use repobeat::sink::{
    ChannelSink, DEFAULT_SINK_CAPACITY, EventSink, LogSink, SinkError, spawn_json_lines_writer,
};
use repobeat::target::TargetList;
use tokio::io::AsyncWrite;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::progress::{LoggingReporter, as_callback};

/// How long to wait for buffered events to be written after collection stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// What the collector should do once started.
pub(crate) enum Mode {
    /// Tick until stopped.
    Run,
    /// One pass, then exit. Empty targets fall back to the configuration.
    Once { targets: Vec<String> },
}

pub(crate) async fn handle_collect(
    mode: Mode,
    config: &Config,
    log_only: bool,
    stop: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = config.collect_options();
    options.validate()?;

    let targets = match &mode {
        Mode::Once { targets } if !targets.is_empty() => TargetList::from_mixed(targets.clone()),
        _ => config.targets(),
    };
    if targets.is_empty() {
        tracing::warn!("No repositories or organizations configured");
    }

    let fetcher = GitHubFetcher::new(config.access_token.as_deref(), config.api_url.as_deref())?;
    if let Some(login) = fetcher.verify().await? {
        tracing::info!(login = %login, "Authenticated with GitHub");
    }

    let (sink, writer): (Arc<dyn EventSink>, Option<JoinHandle<Result<usize, SinkError>>>) =
        if log_only {
            (Arc::new(LogSink), None)
        } else {
            let (sink, rx) = ChannelSink::channel(DEFAULT_SINK_CAPACITY);
            let output = open_output(config.output.path.as_deref()).await?;
            (Arc::new(sink), Some(spawn_json_lines_writer(rx, output)))
        };

    let reporter = Arc::new(LoggingReporter::new());
    let scheduler =
        Scheduler::new(fetcher, sink, targets, options)?.with_progress(as_callback(&reporter));

    match mode {
        Mode::Run => scheduler.run(stop).await,
        Mode::Once { .. } => {
            let report = scheduler.run_once(&stop).await;
            log_report(&report);
            drop(scheduler);
        }
    }

    if let Some(writer) = writer {
        drain(writer).await;
    }

    Ok(())
}

async fn open_output(
    path: Option<&Path>,
) -> std::io::Result<Box<dyn AsyncWrite + Unpin + Send>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            tracing::info!(path = %path.display(), "Writing events to file");
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdout())),
    }
}

/// Wait for the writer to flush what the collector already published.
///
/// Passes abandoned at shutdown still hold the sink until they observe
/// cancellation, so the wait is bounded.
async fn drain(writer: JoinHandle<Result<usize, SinkError>>) {
    match tokio::time::timeout(DRAIN_TIMEOUT, writer).await {
        Ok(Ok(Ok(written))) => tracing::debug!(written, "Event writer finished"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Event writer failed"),
        Ok(Err(e)) => tracing::error!(error = %e, "Event writer task failed"),
        Err(_) => tracing::warn!("Timed out waiting for event writer to drain"),
    }
}

fn log_report(report: &CycleReport) {
    for (identity, error) in &report.failed {
        tracing::debug!(repo = %identity, error = %error, "Repository not collected");
    }
    tracing::info!(
        resolved = report.resolved,
        published = report.published,
        failed = report.failed.len(),
        rejected = report.rejected.len(),
        failed_orgs = report.failed_orgs.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Collection finished"
    );
}
