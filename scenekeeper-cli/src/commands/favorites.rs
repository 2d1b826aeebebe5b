use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scenekeeper_core::PerformerMeta;
use scenekeeper_reconcile::{
    CANONICAL_SYSTEM, HistoryDoc, LocalCatalog, favorite_performers, write_artifact,
};

use super::{AppContext, print_header, stash_client};
use crate::error::CliError;

/// Merge the current scenes of every linked favourite into its history file.
pub(crate) fn run_favorites(ctx: &AppContext) -> Result<(), CliError> {
    let config = ctx.config()?;
    let client = stash_client(&config)?;

    print_header("Favourite performer history");
    let favorites = favorite_performers(&client, CANONICAL_SYSTEM)?;
    for performer in &favorites.unlinked {
        log::warn!(
            "Favourite '{}' ({}) has no {} id; skipped",
            performer.name,
            performer.id,
            CANONICAL_SYSTEM
        );
    }

    let mut scenes_added = 0;
    for (performer, canonical_id) in &favorites.linked {
        let scenes = client.all_performer_scenes(&performer.id)?;
        let path = ctx.layout.history(canonical_id);
        let mut doc = HistoryDoc::load_or_new(
            &path,
            PerformerMeta {
                id: canonical_id.clone(),
                name: Some(performer.name.clone()),
            },
        )?;
        let added = doc.merge(scenes);
        write_artifact(&path, &doc)?;
        scenes_added += added;
        log::info!(
            "  {} ({}): {} new, {} total",
            performer.name.if_supports_color(Stdout, |t| t.bold()),
            canonical_id,
            added,
            doc.scenes.len(),
        );
    }

    log::info!("");
    log::info!(
        "Processed {} performers, skipped {} without a {} id, added {} scenes",
        favorites.linked.len(),
        favorites.unlinked.len(),
        CANONICAL_SYSTEM,
        scenes_added,
    );
    Ok(())
}
