use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scenekeeper_reconcile::{CANONICAL_SYSTEM, LocalScenesDoc, resolve_local_performer, write_artifact};

use super::{AppContext, print_header, print_written, stash_client};
use crate::error::CliError;

/// Step 1: write the performer's local scenes to `01_local_scenes.json`.
pub(crate) fn run_local(ctx: &AppContext, performer: &str) -> Result<(), CliError> {
    let performer = performer.trim();
    if performer.is_empty() {
        return Err(CliError::invalid_argument("performer id is empty"));
    }
    let config = ctx.config()?;
    let client = stash_client(&config)?;

    print_header("Step 1: local library scenes");
    log::info!("  Library: {}", client.url());

    let (resolved, scenes) = resolve_local_performer(&client, CANONICAL_SYSTEM, performer)?;
    if resolved.local_id != resolved.input_id {
        log::info!(
            "  Mapped {} to local performer {} ({})",
            resolved.input_id,
            resolved.local_id.if_supports_color(Stdout, |t| t.cyan()),
            resolved.local_name.as_deref().unwrap_or("unnamed"),
        );
    }
    log::info!("  Found {} local scenes", scenes.len());
    if scenes.is_empty() {
        log::warn!("No local scenes found for {}", performer);
    }

    let path = ctx.layout.local_scenes(performer);
    let doc = LocalScenesDoc {
        input_performer_id: resolved.input_id,
        local_performer_id: resolved.local_id,
        local_performer_name: resolved.local_name,
        scenes,
    };
    write_artifact(&path, &doc)?;
    print_written(&path);
    Ok(())
}
