//! GitHub API error types.

use thiserror::Error;

use crate::platform::{PlatformError, short_error_message};

/// Errors that can occur when setting up or calling the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Map an HTTP status from the GitHub API onto the platform error kinds.
///
/// GitHub answers 403 both for exhausted rate limits and for plain permission
/// denials; only the former mention a rate limit in the message.
pub fn status_to_platform_error(status: u16, message: impl Into<String>) -> PlatformError {
    let message = message.into();
    match status {
        401 => PlatformError::AuthRequired,
        403 if is_rate_limit_message(&message) => PlatformError::rate_limited(message),
        429 => PlatformError::rate_limited(message),
        404 => PlatformError::not_found(message),
        _ => PlatformError::api(format!("{status}: {message}")),
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("rate limit")
}

/// Convert an octocrab error into a platform error.
///
/// API responses are classified by status. A body that fails to decode is an
/// API error; every other failure happened in transport.
pub fn to_platform_error(err: octocrab::Error) -> PlatformError {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            status_to_platform_error(source.status_code.as_u16(), source.message.clone())
        }
        octocrab::Error::Json { .. } => {
            PlatformError::api(format!("malformed response: {}", short_error_message(&err)))
        }
        other => PlatformError::network(short_error_message(&other)),
    }
}

impl From<GitHubError> for PlatformError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Api(e) => to_platform_error(e),
            GitHubError::InvalidUrl(url) => PlatformError::internal(format!("invalid API URL: {url}")),
        }
    }
}
