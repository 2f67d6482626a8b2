//! Run logging
//!
//! When enabled via config, phase transitions and per-region actions are
//! appended to ~/.carvex/carvex.log. Logging failures never break a run.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// Set up file logging if enabled. Returns the log path, or None when
/// logging is off or the file could not be opened.
pub fn init_logging(enabled: bool) -> Result<Option<PathBuf>> {
    if !enabled {
        return Ok(None);
    }

    let log_path = log_file_path()?;

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    match file {
        Ok(log_file) => {
            let subscriber = registry()
                .with(
                    fmt::layer()
                        .with_writer(log_file)
                        .with_ansi(false)
                        .with_target(false),
                )
                .with(EnvFilter::new("carvex=info"));

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

            Ok(Some(log_path))
        }
        Err(e) => {
            // Fall back to no logging rather than failing the run.
            eprintln!("Warning: Could not open log file: {e}");
            Ok(None)
        }
    }
}

fn log_file_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".carvex").join("carvex.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_disabled() {
        let result = init_logging(false).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_log_file_path_under_home() {
        let path = log_file_path().unwrap();
        assert!(path.ends_with(".carvex/carvex.log"));
    }
}
