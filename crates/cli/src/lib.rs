pub mod commands;

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Install the stderr tracing subscriber.
///
/// `--debug` forces `trace`; otherwise `RUST_LOG` decides, defaulting to `warn`.
pub fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when commands run in-process (tests).
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Resolve `path` against the current working directory when it is relative.
pub fn absolutize(path: &str) -> Result<PathBuf> {
    let p = Path::new(path);
    if p.is_absolute() {
        Ok(p.to_path_buf())
    } else {
        let cwd = env::current_dir().context("Failed to get current directory")?;
        Ok(cwd.join(p))
    }
}
