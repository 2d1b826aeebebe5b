use scenekeeper_reconcile::{CanonicalCatalog, CanonicalPerformerDoc, write_artifact};

use super::{AppContext, print_header, print_written, require_canonical_id, stashdb_client};
use crate::error::CliError;

/// Step 2: write the canonical performer and scenes to `02_canonical_performer.json`.
pub(crate) fn run_canonical(ctx: &AppContext, performer: &str) -> Result<(), CliError> {
    let performer = require_canonical_id(performer)?;
    let config = ctx.config()?;
    let client = stashdb_client(&config)?;

    print_header("Step 2: canonical catalog scenes");
    let (meta, scenes) = client.performer_with_scenes(performer)?;
    log::info!(
        "  {} has {} scenes",
        meta.name.as_deref().unwrap_or(performer),
        scenes.len()
    );

    let path = ctx.layout.canonical_performer(performer);
    write_artifact(&path, &CanonicalPerformerDoc::new(meta, scenes))?;
    print_written(&path);
    Ok(())
}
