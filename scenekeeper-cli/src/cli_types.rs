//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scenekeeper")]
#[command(
    about = "Reconcile a local scene library against a canonical catalog and queue missing scenes for acquisition",
    long_about = None
)]
pub(crate) struct Cli {
    /// Directory for run artifacts (one subdirectory per performer)
    #[arg(long, global = true, default_value = "runs")]
    pub out: PathBuf,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by `acquire` and `run`.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct AcquireArgs {
    /// Match episodes but do not queue any searches
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Process at most N missing scenes (after sampling)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Pick N missing scenes at random
    #[arg(long = "random", value_name = "N")]
    pub random: Option<usize>,

    /// Seed for --random, for reproducible samples
    #[arg(long)]
    pub seed: Option<u64>,

    /// Ignore the last-run cutoff and consider every missing scene
    #[arg(long)]
    pub full: bool,

    /// Look-back window in days before the last run (default: config, then 30)
    #[arg(long)]
    pub lookback_days: Option<i64>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Step 1: fetch a performer's scenes from the local library
    Local {
        /// Local performer id, or canonical performer UUID
        performer: String,
    },

    /// Step 2: fetch a performer and their scenes from the canonical catalog
    Canonical {
        /// Canonical performer UUID
        performer: String,
    },

    /// Step 3: list canonical scenes missing from the local library
    Diff {
        /// Canonical performer UUID
        performer: String,
    },

    /// Step 4: queue acquisition searches for missing scenes
    Acquire {
        /// Canonical performer UUID
        performer: String,

        #[command(flatten)]
        args: AcquireArgs,
    },

    /// Run steps 1 to 4 in order
    Run {
        /// Canonical performer UUID
        performer: String,

        #[command(flatten)]
        args: AcquireArgs,
    },

    /// Find duplicate scenes in the local library and tag them
    Duplicates {
        /// Canonical performer UUID (omit with --all)
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        performer: Option<String>,

        /// Scan the entire local library
        #[arg(long)]
        all: bool,

        /// Report only; do not tag anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Minimum title similarity (0.0 - 1.0)
        #[arg(long, default_value_t = 0.9)]
        threshold: f64,

        /// Maximum date difference in days
        #[arg(long, default_value_t = 7)]
        date_window: i64,

        /// Tag applied to duplicates
        #[arg(long, default_value = scenekeeper_reconcile::DUPLICATE_TAG)]
        tag: String,

        /// Tag that marks scenes which must never lose protection
        #[arg(long, default_value = scenekeeper_reconcile::PROTECT_TAG)]
        protect_tag: String,
    },

    /// Record current scenes of favourite performers into history files
    Favorites,

    /// Create unmonitored acquisition series for local studios that lack one
    SyncStudios {
        /// Show what would be created without creating anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Only process the first N missing studios
        #[arg(long)]
        limit_missing: Option<usize>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show every setting and where it came from
    Show,

    /// Print the config file path
    Path,
}
