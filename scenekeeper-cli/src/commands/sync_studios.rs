use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scenekeeper_reconcile::{StudioSyncOptions, sync_studios, write_artifact};

use super::{AppContext, print_header, print_written, stash_client, whisparr_client};
use crate::error::CliError;

/// Create an unmonitored series for every local studio without one.
pub(crate) fn run_sync_studios(
    ctx: &AppContext,
    dry_run: bool,
    limit_missing: Option<usize>,
) -> Result<(), CliError> {
    let config = ctx.config()?;
    let settings = config.studio_sync_settings()?;
    let library = stash_client(&config)?;
    let acquisition = whisparr_client(&config)?;

    print_header("Studio sync");
    let options = StudioSyncOptions {
        root_folder_path: settings.root_folder_path,
        quality_profile_id: settings.quality_profile_id,
        language_profile_id: settings.language_profile_id,
        dry_run,
        limit_missing,
    };
    let report = sync_studios(&library, &acquisition, &options)?;

    let path = ctx.layout.studio_sync_result();
    write_artifact(&path, &report)?;

    log::info!(
        "  {} studios, {} series, {} matched, {} missing",
        report.local_total_studios,
        report.acquisition_total_series,
        report.matched_studios,
        report.missing_studios_found,
    );
    if dry_run {
        log::info!(
            "  Dry run: would create {} series",
            report.missing_studios_processed
        );
    } else {
        log::info!(
            "  {} Created {} series",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            report.created_series,
        );
    }
    print_written(&path);
    Ok(())
}
