//! Logging setup.
//!
//! The terminal belongs to the TUI, so log lines go to a file under the state
//! directory. `CUBIK_LOG` takes precedence over the `-v` count.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CUBIK_LOG";

/// Filter directive for a given verbosity
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing into `path`, appending
pub fn init_logging(path: &Path, verbose: u8) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));

    // a subscriber may already be installed (tests, embedding); keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(verbose >= 2)
        .try_init();

    debug!("cubik started with verbosity level: {}", verbose);
    Ok(())
}
