use super::{AppContext, require_canonical_id};
use crate::cli_types::AcquireArgs;
use crate::commands::{acquire, canonical, diff, local};
use crate::error::CliError;

/// Run steps 1 to 4 for one performer, stopping at the first failure.
pub(crate) fn run_pipeline(ctx: &AppContext, performer: &str, args: &AcquireArgs) -> Result<(), CliError> {
    let performer = require_canonical_id(performer)?;

    local::run_local(ctx, performer)?;
    log::info!("");
    canonical::run_canonical(ctx, performer)?;
    log::info!("");
    diff::run_diff(ctx, performer)?;
    log::info!("");
    acquire::run_acquire(ctx, performer, args)?;
    Ok(())
}
