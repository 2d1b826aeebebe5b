use scenekeeper_reconcile::{
    CANONICAL_SYSTEM, CanonicalPerformerDoc, LocalScenesDoc, MissingDoc, compute_missing,
    read_artifact, write_artifact,
};

use super::{AppContext, print_header, print_written};
use crate::error::CliError;

/// Step 3: compare steps 1 and 2 and write `03_missing.json`.
pub(crate) fn run_diff(ctx: &AppContext, performer: &str) -> Result<(), CliError> {
    let performer = performer.trim();
    let layout = &ctx.layout;

    print_header("Step 3: missing scenes");
    let local: LocalScenesDoc = read_artifact(&layout.local_scenes(performer), "local")?;
    let canonical = CanonicalPerformerDoc::load(&layout.canonical_performer(performer), performer)?;

    let diff = compute_missing(&local.scenes, &canonical.scenes, CANONICAL_SYSTEM);
    log::info!(
        "  Local: {} scenes ({} linked) | Canonical: {} scenes | Missing: {}",
        diff.stats.local_scene_count,
        diff.stats.local_linked_ids,
        diff.stats.canonical_scene_count,
        diff.stats.missing_count,
    );

    let path = layout.missing(performer);
    let doc = MissingDoc {
        performer: canonical.meta(),
        missing_scenes: diff.missing,
        stats: diff.stats,
    };
    write_artifact(&path, &doc)?;
    print_written(&path);
    Ok(())
}
