//! # Flow Catalog CLI (`flowcat`)
//!
//! The `flowcat` binary indexes a corpus of workflow JSON documents into a
//! SQLite catalog and searches it.
//!
//! ## Usage
//!
//! ```bash
//! flowcat --config ./config/flowcat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `flowcat init` | Create the SQLite database and schema |
//! | `flowcat index` | Analyze new and changed workflows |
//! | `flowcat search "<query>"` | Full-text search with filters |
//! | `flowcat category <key>` | Workflows using a category's services |
//! | `flowcat categories` | List category keys |
//! | `flowcat get <filename>` | Show one workflow record |
//! | `flowcat stats` | Catalog statistics |
//! | `flowcat export` | Write a static JSON search index |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use flow_catalog::catalog::RecordFilter;
use flow_catalog::ingest::IndexOptions;
use flow_catalog::progress::ProgressMode;
use flow_catalog::{config, export, get, ingest, logging, migrate, search, stats};

/// Flow Catalog CLI: index and search a corpus of workflow documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/flowcat.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "flowcat",
    about = "Flow Catalog — index and search a corpus of workflow documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/flowcat.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr (overrides RUST_LOG and config).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the workflows table and its
    /// full-text index. Running it multiple times is safe.
    Init,

    /// Index the corpus.
    ///
    /// Walks the corpus root and analyzes every workflow whose content
    /// changed since the last run. Unreadable or malformed files are
    /// counted as errors and skipped.
    Index {
        /// Re-analyze every workflow, ignoring stored fingerprints.
        #[arg(long)]
        force: bool,

        /// Remove records whose file is no longer in the corpus.
        #[arg(long)]
        prune: bool,

        /// Progress on stderr: off, human, or json. Defaults to human on a TTY.
        #[arg(long)]
        progress: Option<ProgressMode>,
    },

    /// Search indexed workflows.
    ///
    /// With a query, results are ranked by relevance; without one, the
    /// most recently analyzed workflows come first.
    Search {
        /// Free-text query. Every term must match.
        query: Option<String>,

        /// Trigger filter: manual, webhook, scheduled, complex, or all.
        #[arg(long, default_value = "all")]
        trigger: String,

        /// Complexity filter: low, medium, high, or all.
        #[arg(long, default_value = "all")]
        complexity: String,

        /// Only active workflows.
        #[arg(long)]
        active_only: bool,

        /// Page number, starting at 1.
        #[arg(long, default_value = "1")]
        page: i64,

        /// Results per page (capped by `retrieval.max_limit`).
        #[arg(long)]
        per_page: Option<i64>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List workflows that use any service of a category.
    Category {
        /// Category key (see `flowcat categories`).
        key: String,

        #[arg(long, default_value = "1")]
        page: i64,

        #[arg(long)]
        per_page: Option<i64>,

        #[arg(long)]
        json: bool,
    },

    /// List category keys and the services they group.
    Categories,

    /// Show one workflow by its corpus-relative filename.
    Get {
        /// Filename as stored in the catalog, e.g. `Slack/0001_Slack_Alert.json`.
        filename: String,

        /// Print the source JSON document instead of the record.
        #[arg(long)]
        raw: bool,

        #[arg(long)]
        json: bool,
    },

    /// Show catalog statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Export the catalog as a static JSON search index.
    Export {
        /// Output file. Writes to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Categories = cli.command {
        search::run_categories();
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init_logger(&cfg.logging.level, cli.verbose);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index {
            force,
            prune,
            progress,
        } => {
            let options = IndexOptions {
                force,
                prune: prune || cfg.corpus.prune_missing,
            };
            let reporter = progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();
            ingest::run_index(&cfg, options, reporter.as_ref()).await?;
        }
        Commands::Search {
            query,
            trigger,
            complexity,
            active_only,
            page,
            per_page,
            json,
        } => {
            let filter = RecordFilter {
                trigger: search::parse_trigger_filter(&trigger)?,
                complexity: search::parse_complexity_filter(&complexity)?,
                active_only,
            };
            search::run_search(&cfg, query.as_deref(), filter, page, per_page, json).await?;
        }
        Commands::Category {
            key,
            page,
            per_page,
            json,
        } => {
            search::run_category(&cfg, &key, page, per_page, json).await?;
        }
        Commands::Categories => search::run_categories(),
        Commands::Get {
            filename,
            raw,
            json,
        } => {
            get::run_get(&cfg, &filename, raw, json).await?;
        }
        Commands::Stats { json } => {
            stats::run_stats(&cfg, json).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
    }

    Ok(())
}
