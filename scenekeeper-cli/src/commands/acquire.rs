use chrono::Utc;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scenekeeper_reconcile::{
    AcquisitionActionsDoc, CutoffResult, JsonStateStore, MissingDoc, RunLog, Selection,
    StateStore, apply_cutoff, read_artifact, run_acquisition, write_artifact,
};

use super::{AppContext, print_header, print_written, whisparr_client};
use crate::cli_types::AcquireArgs;
use crate::error::CliError;
use crate::progress::BarProgress;

/// Step 4: match missing scenes to episodes and queue searches.
pub(crate) fn run_acquire(ctx: &AppContext, performer: &str, args: &AcquireArgs) -> Result<(), CliError> {
    let performer = performer.trim();
    let config = ctx.config()?;
    let lookback_days = config.lookback_days(args.lookback_days);
    if lookback_days < 0 {
        return Err(CliError::invalid_argument("--lookback-days must not be negative"));
    }
    let client = whisparr_client(&config)?;
    let layout = &ctx.layout;

    print_header("Step 4: acquisition");
    let missing: MissingDoc = read_artifact(&layout.missing(performer), "diff")?;
    let total_missing = missing.missing_scenes.len();

    let store = JsonStateStore::new(layout.acquisition_state(performer));
    let mut state = store.load()?;
    let cutoff = state.cutoff(lookback_days, args.full);

    let CutoffResult {
        selected,
        skipped_old,
        skipped_previously_tried,
    } = apply_cutoff(missing.missing_scenes, &state, cutoff);

    let selection = Selection {
        sample: args.random,
        seed: args.seed,
        limit: args.limit,
    };
    let candidates = selection.apply(selected);

    match cutoff {
        Some(at) => log::info!(
            "  Cutoff {} ({} days before last run): {} of {} missing scenes skipped ({} tried before)",
            at.format("%Y-%m-%d %H:%M UTC"),
            lookback_days,
            skipped_old,
            total_missing,
            skipped_previously_tried,
        ),
        None if args.full => log::info!("  Full run: no cutoff"),
        None => log::info!("  First run: no cutoff"),
    }
    log::info!(
        "  Processing {} of {} missing scenes{}",
        candidates.len(),
        total_missing,
        if args.dry_run { " (dry run)" } else { "" },
    );

    let progress = BarProgress::new(ctx.quiet);
    let outcomes = run_acquisition(
        &client,
        &candidates,
        &mut state,
        &Utc::now,
        args.dry_run,
        &progress,
    )?;

    store.save(&state)?;

    let actions_path = layout.acquisition_actions(performer);
    write_artifact(
        &actions_path,
        &AcquisitionActionsDoc {
            processed: outcomes.len(),
            cutoff_utc: cutoff,
            skipped_old,
            skipped_previously_tried,
            results: outcomes.clone(),
        },
    )?;

    let mut run_log = RunLog::new(performer, args.dry_run);
    run_log.set_selection(cutoff, total_missing, skipped_old);
    for outcome in outcomes {
        run_log.add(outcome);
    }
    let log_path = layout.readable_log(performer);
    run_log.append_to_file(&log_path)?;

    let summary = run_log.summary();
    log::info!("");
    log::info!(
        "  {} queued, {} dry-run, {} episode not found, {} series missing, {} no studio, {}",
        summary.queued.if_supports_color(Stdout, |t| t.green()),
        summary.dry_run,
        summary.episode_not_found,
        summary.studio_missing,
        summary.skipped_no_studio,
        format!("{} failed", summary.failed).if_supports_color(Stdout, |t| t.red()),
    );
    print_written(&actions_path);
    print_written(store.path());
    print_written(&log_path);
    Ok(())
}
