//! # Clonetime CLI (`clonetime`)
//!
//! Estimate how many hours it would take to rebuild a website.
//!
//! ## Usage
//!
//! ```bash
//! clonetime --config ./config/clonetime.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `clonetime init` | Create the SQLite database and run schema migrations |
//! | `clonetime analyze <url> --tier <tier>` | Crawl and estimate a site (cached) |
//! | `clonetime list` | Show recent public analyses |
//! | `clonetime fingerprint <url> --tier <tier>` | Print the canonical URL and cache key |
//! | `clonetime serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! clonetime init
//! clonetime analyze example.com --tier mvp
//! clonetime list --search example
//! CLONETIME_LOG=debug clonetime serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use clonetime::{config, migrate, report, server};

/// Clonetime CLI: rebuild-time estimates for websites.
///
/// All commands except `fingerprint` accept a `--config` flag pointing to a
/// TOML configuration file. See `config/clonetime.example.toml`.
#[derive(Parser)]
#[command(
    name = "clonetime",
    about = "Estimate how long it would take to rebuild a website",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/clonetime.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `analyses` table. This
    /// command is idempotent.
    Init,

    /// Estimate a site at a quality tier.
    ///
    /// Returns the cached estimate when one exists for the same canonical
    /// URL and tier.
    Analyze {
        /// Site URL; `https://` is assumed when no scheme is given.
        url: String,

        /// Quality tier: `speedrun`, `mvp`, or `prod-lite`.
        #[arg(long)]
        tier: String,

        /// Re-run even if cached. Ignored unless runtime mode is development.
        #[arg(long)]
        force: bool,

        /// Print the estimate as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List recent public analyses, newest first.
    List {
        /// Maximum rows (default 10, at most 50).
        #[arg(long)]
        limit: Option<i64>,

        /// Case-insensitive URL substring filter.
        #[arg(long)]
        search: Option<String>,

        /// Print rows as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical URL and cache fingerprint.
    Fingerprint {
        url: String,

        #[arg(long)]
        tier: String,
    },

    /// Start the HTTP API server on `[server].bind`.
    Serve,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CLONETIME_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    // Commands that don't require config
    if let Commands::Fingerprint { url, tier } = &cli.command {
        return report::run_fingerprint(url, tier);
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Analyze {
            url,
            tier,
            force,
            json,
        } => {
            report::run_analyze(&cfg, &url, &tier, force, json).await?;
        }
        Commands::List {
            limit,
            search,
            json,
        } => {
            report::run_list(&cfg, limit, search, json).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Fingerprint { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
