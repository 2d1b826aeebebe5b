//! Logger setup: `env_logger` writing to stderr, optionally teed to a file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use log::LevelFilter;

/// Writes to stderr and, when set, to a file with ANSI escapes removed.
pub(crate) struct TeeWriter<W: Write> {
    terminal: W,
    file: Option<File>,
}

impl<W: Write> TeeWriter<W> {
    pub(crate) fn new(terminal: W, file: Option<File>) -> Self {
        Self { terminal, file }
    }
}

impl<W: Write> Write for TeeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.terminal.write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            file.write_all(&strip_ansi_escapes::strip(buf))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.terminal.flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

pub(crate) fn level_for(quiet: bool, verbose: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Install the global logger.
///
/// Normal output is the bare message. `--verbose` adds timestamps, levels
/// and module targets. Third-party crates only log warnings and above.
pub(crate) fn init(quiet: bool, verbose: bool, logfile: Option<&Path>) -> io::Result<()> {
    let file = match logfile {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Some(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?,
            )
        }
        None => None,
    };

    let level = level_for(quiet, verbose);
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module("scenekeeper", level)
        .target(env_logger::Target::Pipe(Box::new(TeeWriter::new(
            io::stderr(),
            file,
        ))));

    if verbose {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    } else {
        builder.format(|buf, record| match record.level() {
            log::Level::Warn => writeln!(buf, "warning: {}", record.args()),
            log::Level::Error => writeln!(buf, "error: {}", record.args()),
            _ => writeln!(buf, "{}", record.args()),
        });
    }

    builder.init();
    Ok(())
}
