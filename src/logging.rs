use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BOARDUST_LOG";

/// Where log lines go.
pub enum LogTarget<'a> {
    /// Command line use: stderr, next to the command output.
    Stderr,
    /// Interactive board: a file, so the terminal screen stays intact.
    File(&'a Path),
}

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `BOARDUST_LOG` wins over `-v` flags.
pub fn init(target: LogTarget<'_>, verbosity: u8) -> io::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("boardust={}", default_level(verbosity))));

    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .with_target(false)
                .try_init();
        }
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
        }
    }
    Ok(())
}
