//! # Caffeine Lookup CLI (`caff`)
//!
//! ## Usage
//!
//! ```bash
//! caff --config ./config/caff.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `caff refresh` | Refresh the drink store (cache when fresh, sources otherwise) |
//! | `caff drink "<name>"` | Answer how much caffeine a drink has |
//! | `caff ask "<question>"` | Match and answer a whole question |
//! | `caff sources` | Show sources, cache slots and staleness |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use caffeine_lookup::config::{self, Config};
use caffeine_lookup::fetch::HttpFetcher;
use caffeine_lookup::settings::FileSettings;
use caffeine_lookup::store::{self, DrinkStore};
use caffeine_lookup::{answer, query, service, sources};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Caffeine Lookup CLI: answers how much caffeine is in a drink.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/caff.example.toml` for a full example. Built-in
/// defaults are used when the file does not exist.
#[derive(Parser)]
#[command(
    name = "caff",
    about = "Caffeine Lookup: how much caffeine is in that drink",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/caff.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the drink store.
    ///
    /// Reuses the cache slots when they are fresh; otherwise fetches both
    /// sources, merges them and rewrites the slots.
    Refresh {
        /// Fetch the sources even when the cache is fresh.
        #[arg(long)]
        force: bool,
    },

    /// Answer a drink name, as a voice host would pass it.
    Drink {
        /// The drink as heard, e.g. "a cup of coffee".
        name: String,

        /// Answer in metric servings.
        #[arg(long)]
        metric: bool,

        /// List every matching drink instead of offering to.
        #[arg(long)]
        all: bool,
    },

    /// Match a whole question and answer it if it is about a drink.
    Ask {
        /// The question, e.g. "what is the caffeine content of diet coke".
        utterance: String,

        #[arg(long)]
        metric: bool,

        #[arg(long)]
        all: bool,
    },

    /// List the sources with their cache slots and staleness.
    Sources,
}

fn load(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        Ok(Config::minimal())
    }
}

fn open_store(cfg: &Config) -> anyhow::Result<DrinkStore> {
    let fetcher = Arc::new(HttpFetcher::new(cfg.sources.timeout_secs)?);
    let settings = Arc::new(FileSettings::in_dir(&cfg.cache.dir));
    Ok(DrinkStore::new(cfg.clone(), fetcher, settings))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load(&cli.config)?;

    match cli.command {
        Commands::Refresh { force } => {
            let store = open_store(&cfg)?;
            if force {
                eprintln!("{}", answer::UPDATING);
            }
            store::run_refresh(&store, force).await?;
        }
        Commands::Drink { name, metric, all } => {
            service::run_drink(&cfg, &name, metric, all).await?;
        }
        Commands::Ask {
            utterance,
            metric,
            all,
        } => {
            query::run_ask(&cfg, &utterance, metric, all).await?;
        }
        Commands::Sources => {
            let store = open_store(&cfg)?;
            sources::list_sources(&store)?;
        }
    }

    Ok(())
}
