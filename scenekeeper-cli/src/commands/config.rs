use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scenekeeper_client::ValueSource;

use super::AppContext;
use crate::error::CliError;

/// Show every setting with its source. Keys are masked.
pub(crate) fn run_config_show(ctx: &AppContext) -> Result<(), CliError> {
    let config = ctx.config()?;

    log::info!(
        "{}",
        "scenekeeper configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");

    let expected = ctx.config_path.clone().or_else(scenekeeper_client::config_path);
    match (&config.path, &expected) {
        (Some(p), _) => log::info!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        ),
        (None, Some(p)) => log::info!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        ),
        (None, None) => log::info!(
            "  Config file: {}",
            "could not determine path".if_supports_color(Stdout, |t| t.red()),
        ),
    }
    log::info!("");

    for (name, value, source) in config.entries() {
        let source_str = format!("({})", source);
        let source_str = match source {
            ValueSource::Missing => source_str.if_supports_color(Stdout, |t| t.red()).to_string(),
            _ => source_str.if_supports_color(Stdout, |t| t.dimmed()).to_string(),
        };
        log::info!("  {:<28} {} {}", name, value, source_str);
    }
    Ok(())
}

/// Print the config file path.
pub(crate) fn run_config_path(ctx: &AppContext) -> Result<(), CliError> {
    match ctx.config_path.clone().or_else(scenekeeper_client::config_path) {
        Some(p) => {
            println!("{}", p.display());
            Ok(())
        }
        None => Err(CliError::invalid_argument(
            "could not determine config directory",
        )),
    }
}
