use chrono::Utc;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scenekeeper_reconcile::{
    CANONICAL_SYSTEM, DuplicateOptions, DuplicateReport, LocalCatalog, apply_tag_updates,
    collect_pages, find_duplicates, plan_tag_updates, resolve_local_performer, write_artifact,
};

use super::{AppContext, print_header, print_written, stash_client};
use crate::error::CliError;

pub(crate) struct DuplicateArgs {
    pub performer: Option<String>,
    pub dry_run: bool,
    pub threshold: f64,
    pub date_window: i64,
    pub tag: String,
    pub protect_tag: String,
}

/// Run the `duplicates` command.
pub(crate) fn run_duplicates(ctx: &AppContext, args: &DuplicateArgs) -> Result<(), CliError> {
    if !(0.0..=1.0).contains(&args.threshold) {
        return Err(CliError::invalid_argument("--threshold must be between 0 and 1"));
    }
    if args.date_window < 0 {
        return Err(CliError::invalid_argument("--date-window must not be negative"));
    }
    let config = ctx.config()?;
    let client = stash_client(&config)?;

    print_header("Duplicate scenes");
    let performer = args.performer.as_deref().map(str::trim);
    let scenes = match performer {
        Some(id) => {
            let (resolved, scenes) = resolve_local_performer(&client, CANONICAL_SYSTEM, id)?;
            log::info!(
                "  Performer {} ({}): {} scenes",
                resolved.local_id,
                resolved.local_name.as_deref().unwrap_or(id),
                scenes.len()
            );
            scenes
        }
        None => {
            let scenes = collect_pages(|page| client.all_scenes(page))?;
            log::info!("  Whole library: {} scenes", scenes.len());
            scenes
        }
    };

    let options = DuplicateOptions {
        similarity_threshold: args.threshold,
        date_window_days: args.date_window,
    };
    let candidates = find_duplicates(&scenes, &options);
    log::info!("  Found {} duplicate pairs", candidates.len());
    for c in &candidates {
        log::info!(
            "    keep {} '{}' | duplicate {} '{}' ({:.3})",
            c.keep.id,
            c.keep.title,
            c.duplicate.id.if_supports_color(Stdout, |t| t.yellow()),
            c.duplicate.title,
            c.similarity,
        );
    }

    let report_path = ctx.layout.duplicates_report(performer);
    write_artifact(&report_path, &DuplicateReport::new(Utc::now(), &candidates))?;
    print_written(&report_path);

    let updates = plan_tag_updates(&candidates, &args.tag, &args.protect_tag);
    if args.dry_run {
        log::info!(
            "  Dry run: would update tags on {} scenes",
            updates.len()
        );
        return Ok(());
    }

    let stats = apply_tag_updates(&client, &updates, &args.tag, &args.protect_tag)?;
    log::info!(
        "  {} Updated {} scenes ({} tagged '{}', {} gained '{}')",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        stats.scenes_updated,
        stats.duplicates_tagged,
        args.tag,
        stats.protection_added,
        args.protect_tag,
    );
    Ok(())
}
