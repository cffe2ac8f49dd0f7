//! GitHub adapter for the collector.
//!
//! # Module Structure
//!
//! - [`error`] - Error types and mapping onto `PlatformError`
//! - [`types`] - Wire shapes of the REST responses
//! - [`client`] - Client creation and the `ResourceFetcher` implementation
//! - [`convert`] - Conversion to platform types
//!
//! ```ignore
//! use repobeat::github::GitHubFetcher;
//!
//! let fetcher = GitHubFetcher::new(Some(&token), None)?;
//! fetcher.verify().await?;
//! ```

mod client;
mod convert;
mod error;
mod types;

pub use client::{GitHubFetcher, create_client};
pub use error::{GitHubError, status_to_platform_error, to_platform_error};
pub use types::PAGE_SIZE;
