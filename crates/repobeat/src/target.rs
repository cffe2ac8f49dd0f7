//! Collection targets: explicit repositories and whole organizations.
//!
//! Targets are configured as plain strings. A repository is written
//! `owner/name`; anything without a separator is an organization login.
//! Malformed entries are rejected one at a time with a [`TargetError`] so a
//! single typo never prevents the rest of the list from being collected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between owner and name in a repository target.
pub const REPO_SEPARATOR: char = '/';

/// Format errors for configured targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("Invalid repository '{input}': expected [owner]/[name]")]
    InvalidRepository { input: String },

    #[error("Invalid organization '{input}': expected a single login without '/' or whitespace")]
    InvalidOrganization { input: String },
}

impl TargetError {
    /// The raw configured string that was rejected.
    pub fn input(&self) -> &str {
        match self {
            Self::InvalidRepository { input } | Self::InvalidOrganization { input } => input,
        }
    }
}

/// Owner and name of one repository; the unit of work inside a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    /// Repository owner (user or organization login).
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepositoryIdentity {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Get the full name (owner/name).
    #[inline]
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}{}{}", self.owner, REPO_SEPARATOR, self.name)
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.owner, REPO_SEPARATOR, self.name)
    }
}

impl FromStr for RepositoryIdentity {
    type Err = TargetError;

    /// Parse `owner/name`. Exactly two non-empty segments are accepted, taken
    /// verbatim apart from the surrounding whitespace of the whole input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split(REPO_SEPARATOR).collect();

        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(*owner, *name))
            }
            _ => Err(TargetError::InvalidRepository {
                input: s.to_string(),
            }),
        }
    }
}

/// Validate an organization login.
pub fn parse_organization(s: &str) -> Result<String, TargetError> {
    let trimmed = s.trim();
    if !trimmed.is_empty()
        && !trimmed.contains(REPO_SEPARATOR)
        && !trimmed.chars().any(char::is_whitespace)
    {
        Ok(trimmed.to_string())
    } else {
        Err(TargetError::InvalidOrganization {
            input: s.to_string(),
        })
    }
}

/// The raw configured target strings, kept unparsed so every cycle reports
/// format errors against the exact input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetList {
    /// Explicit repositories, `owner/name`.
    pub repos: Vec<String>,
    /// Organization logins.
    pub orgs: Vec<String>,
}

impl TargetList {
    pub fn new(repos: Vec<String>, orgs: Vec<String>) -> Self {
        Self { repos, orgs }
    }

    /// Split a mixed list into repositories and organizations by the presence
    /// of the separator. Validation is deferred to resolution.
    pub fn from_mixed<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for target in targets {
            let target = target.into();
            if target.contains(REPO_SEPARATOR) {
                list.repos.push(target);
            } else {
                list.orgs.push(target);
            }
        }
        list
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty() && self.orgs.is_empty()
    }

    /// Total number of configured targets.
    #[inline]
    pub fn len(&self) -> usize {
        self.repos.len() + self.orgs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repository_identity() {
        let id: RepositoryIdentity = "octocat/Hello-World".parse().unwrap();
        assert_eq!(id.owner, "octocat");
        assert_eq!(id.name, "Hello-World");
        assert_eq!(id.full_name(), "octocat/Hello-World");
        assert_eq!(id.to_string(), "octocat/Hello-World");
    }

    #[test]
    fn test_parse_repository_trims_surrounding_whitespace() {
        let id: RepositoryIdentity = "  rust-lang/rust ".parse().unwrap();
        assert_eq!(id, RepositoryIdentity::new("rust-lang", "rust"));
    }

    #[test]
    fn test_parse_repository_rejects_wrong_shapes() {
        for input in [
            "",
            "badformat",
            "/",
            "owner/",
            "/name",
            "a/b/c",
            "a//b",
        ] {
            let err = input.parse::<RepositoryIdentity>().unwrap_err();
            assert_eq!(
                err,
                TargetError::InvalidRepository {
                    input: input.to_string()
                },
                "input {input:?} should be rejected"
            );
            assert_eq!(err.input(), input);
        }
    }

    #[test]
    fn test_parse_repository_keeps_inner_whitespace() {
        let id: RepositoryIdentity = "own er/name".parse().unwrap();
        assert_eq!(id, RepositoryIdentity::new("own er", "name"));

        let id: RepositoryIdentity = "owner/na me".parse().unwrap();
        assert_eq!(id, RepositoryIdentity::new("owner", "na me"));
    }

    #[test]
    fn test_parse_organization() {
        assert_eq!(parse_organization("rust-lang").unwrap(), "rust-lang");
        assert_eq!(parse_organization(" tokio-rs ").unwrap(), "tokio-rs");
        assert!(parse_organization("").is_err());
        assert!(parse_organization("a/b").is_err());
        assert!(parse_organization("two words").is_err());
    }

    #[test]
    fn test_target_list_from_mixed() {
        let list = TargetList::from_mixed(["octocat/Hello-World", "rust-lang", "a/b/c"]);
        assert_eq!(list.repos, vec!["octocat/Hello-World", "a/b/c"]);
        assert_eq!(list.orgs, vec!["rust-lang"]);
        assert_eq!(list.len(), 3);
        assert!(!list.is_empty());
        assert!(TargetList::default().is_empty());
    }
}
