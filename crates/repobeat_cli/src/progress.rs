//! Progress reporting for collection cycles.
//!
//! Progress is rendered as structured log lines; the collector runs
//! unattended, so there is no interactive mode.

mod logging;

use std::sync::Arc;

use repobeat::collect::ProgressCallback;

pub use logging::LoggingReporter;

/// Convert a shared reporter into a callback for the library.
pub fn as_callback(reporter: &Arc<LoggingReporter>) -> ProgressCallback {
    let reporter = Arc::clone(reporter);
    Box::new(move |event| {
        reporter.handle(event);
    })
}
