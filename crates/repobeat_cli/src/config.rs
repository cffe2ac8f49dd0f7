//! Configuration file support for repobeat.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `REPOBEAT_`, e.g., `REPOBEAT_PERIOD`)
//! 2. `--config <PATH>`, or `./repobeat.toml` when no path is given
//! 3. XDG config file (~/.config/repobeat/config.toml)
//! 4. Built-in defaults
//!
//! `GITHUB_TOKEN` is used when no access token is configured any other way.
//!
//! Example config file:
//! ```toml
//! access_token = "ghp_..."          # or REPOBEAT_ACCESS_TOKEN / GITHUB_TOKEN
//! # api_url = "https://github.example.com/api/v3"
//! period = 60                       # seconds between cycles
//! job_timeout = 30                  # seconds before a cycle is abandoned
//! concurrency = 8
//! partial_events = "emit"           # or "drop"
//! repos = ["octocat/Hello-World"]
//! orgs = ["rust-lang"]
//!
//! [output]
//! path = "/var/lib/repobeat/events.ndjson"   # stdout when unset
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use repobeat::collect::{
    CollectOptions, DEFAULT_CONCURRENCY, DEFAULT_JOB_TIMEOUT, DEFAULT_PERIOD, PartialEventPolicy,
};
use repobeat::target::TargetList;
use serde::Deserialize;

/// Fallback environment variable for the access token.
const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub personal access token. Unauthenticated when unset.
    pub access_token: Option<String>,
    /// Base URL of a GitHub Enterprise API.
    pub api_url: Option<String>,
    /// Seconds between cycle starts.
    pub period: u64,
    /// Seconds before a cycle's outstanding work is abandoned.
    pub job_timeout: u64,
    /// Maximum repositories aggregated at once per cycle.
    pub concurrency: usize,
    /// What to do with events interrupted by the timeout or shutdown.
    pub partial_events: PartialEventPolicy,
    /// Explicit repositories, `owner/name`.
    pub repos: Vec<String>,
    /// Organizations whose repositories are all collected.
    pub orgs: Vec<String>,
    /// Event output.
    pub output: OutputConfig,
}

/// Where events are written.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Append newline-delimited JSON to this file; stdout when unset.
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: None,
            api_url: None,
            period: DEFAULT_PERIOD.as_secs(),
            job_timeout: DEFAULT_JOB_TIMEOUT.as_secs(),
            concurrency: DEFAULT_CONCURRENCY,
            partial_events: PartialEventPolicy::default(),
            repos: Vec::new(),
            orgs: Vec::new(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        match path {
            Some(path) => {
                tracing::debug!("Loading config from {:?}", path);
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                let local_config = PathBuf::from("repobeat.toml");
                if local_config.exists() {
                    tracing::debug!("Loading config from ./repobeat.toml");
                    builder = builder.add_source(
                        File::from(local_config)
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        // REPOBEAT_ACCESS_TOKEN -> access_token, REPOBEAT_OUTPUT__PATH -> output.path
        builder = builder.add_source(
            Environment::with_prefix("REPOBEAT")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("repos")
                .with_list_parse_key("orgs")
                .try_parsing(true),
        );

        let mut config: Config = builder.build()?.try_deserialize()?;
        if config.access_token.is_none() {
            config.access_token = std::env::var(GITHUB_TOKEN_ENV)
                .ok()
                .filter(|token| !token.trim().is_empty());
        }

        Ok(config)
    }

    /// Collector options derived from this configuration.
    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            period: Duration::from_secs(self.period),
            job_timeout: Duration::from_secs(self.job_timeout),
            concurrency: self.concurrency,
            partial_events: self.partial_events,
        }
    }

    /// The configured targets.
    pub fn targets(&self) -> TargetList {
        TargetList::new(self.repos.clone(), self.orgs.clone())
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "repobeat").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
