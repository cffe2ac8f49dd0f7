//! Repobeat CLI - periodic GitHub repository statistics collector.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::commands::collect::Mode;

#[derive(Parser)]
#[command(name = "repobeat")]
#[command(version)]
#[command(about = "Periodically collect GitHub repository statistics")]
#[command(
    long_about = "Repobeat polls the GitHub API on a fixed period for a configured set of \
repositories and organizations, and emits one JSON event per repository per cycle with \
stars, forks, contributors, branches, languages, participation, license and release \
download statistics."
)]
#[command(after_long_help = r#"EXAMPLES
    Collect continuously using the configured targets:
        $ repobeat run

    Collect once for a repository and a whole organization:
        $ repobeat once octocat/Hello-World rust-lang

    Generate shell completions:
        $ repobeat completions bash > ~/.local/share/bash-completion/completions/repobeat

CONFIGURATION
    Repobeat reads configuration from:
      1. ~/.config/repobeat/config.toml (or $XDG_CONFIG_HOME/repobeat/config.toml)
      2. ./repobeat.toml, or the file given with --config
      3. Environment variables (REPOBEAT_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    REPOBEAT_ACCESS_TOKEN     GitHub personal access token (falls back to GITHUB_TOKEN)
    REPOBEAT_API_URL          GitHub Enterprise API base URL
    REPOBEAT_PERIOD           Seconds between cycles (default: 60)
    REPOBEAT_JOB_TIMEOUT      Seconds before a cycle is abandoned (default: 30)
    REPOBEAT_REPOS            Comma-separated owner/name list
    REPOBEAT_ORGS             Comma-separated organization list
    REPOBEAT_OUTPUT__PATH     File to append events to (default: stdout)
"#)]
struct Cli {
    /// Configuration file (default: ./repobeat.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect on every period until interrupted
    Run {
        /// Log a summary of each event instead of writing JSON
        #[arg(long)]
        log_only: bool,
    },
    /// Run a single collection cycle and exit
    Once {
        /// Targets to collect: `owner/name` for a repository, a bare name for an
        /// organization (default: configured targets)
        targets: Vec<String>,

        /// Log a summary of each event instead of writing JSON
        #[arg(long)]
        log_only: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Events go to stdout, so logs always go to stderr.
fn init_tracing(format: LogFormat) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("repobeat=info,repobeat_cli=info"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(());
    }

    init_tracing(cli.log_format);

    // Load configuration (defaults -> config files -> env vars)
    let config = config::Config::load(cli.config.as_deref())?;

    let stop = CancellationToken::new();
    shutdown::setup_shutdown_handler(stop.clone());

    match cli.command {
        Commands::Run { log_only } => {
            commands::collect::handle_collect(Mode::Run, &config, log_only, stop).await?;
        }
        Commands::Once { targets, log_only } => {
            commands::collect::handle_collect(Mode::Once { targets }, &config, log_only, stop)
                .await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
