//! scenekeeper CLI
//!
//! Reconciles a local scene library against a canonical metadata catalog and
//! queues searches for missing scenes in the acquisition system.

mod cli_types;
mod commands;
mod error;
mod logging;
mod progress;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use scenekeeper_reconcile::RunLayout;

use cli_types::{Cli, Commands, ConfigAction};
use commands::AppContext;
use commands::duplicates::DuplicateArgs;
use error::CliError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.quiet, cli.verbose, cli.logfile.as_deref()) {
        eprintln!("Failed to open log file: {}", e);
        std::process::exit(1);
    }

    let ctx = AppContext {
        config_path: cli.config.clone(),
        layout: RunLayout::new(cli.out.clone()),
        quiet: cli.quiet,
    };

    if let Err(e) = dispatch(&ctx, cli.command) {
        log::error!(
            "{} {}",
            "\u{2718}".if_supports_color(Stderr, |t| t.red()),
            e
        );
        std::process::exit(1);
    }
}

fn dispatch(ctx: &AppContext, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Local { performer } => commands::local::run_local(ctx, &performer),
        Commands::Canonical { performer } => commands::canonical::run_canonical(ctx, &performer),
        Commands::Diff { performer } => commands::diff::run_diff(ctx, &performer),
        Commands::Acquire { performer, args } => {
            commands::acquire::run_acquire(ctx, &performer, &args)
        }
        Commands::Run { performer, args } => {
            commands::pipeline::run_pipeline(ctx, &performer, &args)
        }
        Commands::Duplicates {
            performer,
            all: _,
            dry_run,
            threshold,
            date_window,
            tag,
            protect_tag,
        } => commands::duplicates::run_duplicates(
            ctx,
            &DuplicateArgs {
                performer,
                dry_run,
                threshold,
                date_window,
                tag,
                protect_tag,
            },
        ),
        Commands::Favorites => commands::favorites::run_favorites(ctx),
        Commands::SyncStudios {
            dry_run,
            limit_missing,
        } => commands::sync_studios::run_sync_studios(ctx, dry_run, limit_missing),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(ctx),
            ConfigAction::Path => commands::config::run_config_path(ctx),
        },
    }
}
