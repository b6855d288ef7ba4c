// Logging - env_logger piped to a file so the terminal display stays clean

use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Builder, Env, Target};

use crate::error::{OrreryError, Result};

/// Route `log` records to `path`, filtered by `RUST_LOG` (default `info`).
pub fn init(path: &Path) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| OrreryError::Logging(e.to_string()))
}
