//! Minimal stderr sink for the `log` facade.

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Maps the verbosity flags onto a level filter.
#[must_use]
pub(crate) fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the stderr logger for the rest of the process.
pub(crate) fn install(level: LevelFilter) -> Result<()> {
    log::set_boxed_logger(Box::new(StderrLogger { level }))
        .context("a logger was already installed")?;
    log::set_max_level(level);
    Ok(())
}
