//! Platform-agnostic resource fetching.
//!
//! This module defines the `ResourceFetcher` trait: one fetch method per kind
//! of repository data the collector needs, plus organization listing. The
//! GitHub adapter in [`crate::github`] implements it on top of octocrab; tests
//! use an in-memory mock.
//!
//! # Example
//!
//! ```ignore
//! use repobeat::platform::ResourceFetcher;
//!
//! async fn stars<F: ResourceFetcher>(fetcher: &F) -> Result<u64, PlatformError> {
//!     let repo = fetcher.repository("octocat", "Hello-World").await?;
//!     Ok(repo.stargazers)
//! }
//! ```

mod errors;
#[cfg(test)]
pub(crate) mod mock;
mod types;

pub use errors::{PlatformError, Result, short_error_message};
pub use types::{
    Branch, Contributor, LanguageBytes, LicenseInfo, LicenseKind, Participation, Release,
    RepoMetadata, ResourceFetcher,
};
