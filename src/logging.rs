//! Logger initialisation
//!
//! The TUI owns the terminal, so log output goes to a file in the per-user
//! data directory (or nowhere). `RUST_LOG` overrides the configured level.

use crate::config::{LoggingConfig, APP_DIR};
use env_logger::{Builder, Env, Target};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;

/// Path of the log file, creating its directory if needed
pub fn log_path() -> io::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no data directory"))?;
    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir.join("debouncer.log"))
}

/// Install the global logger.
///
/// Returns the log file path when logging to a file. Calling this twice
/// leaves the first logger in place.
pub fn init_logging(config: &LoggingConfig) -> io::Result<Option<PathBuf>> {
    let env = Env::default().default_filter_or(config.level.as_str());
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    let path = if config.file {
        let path = log_path()?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        builder.target(Target::Pipe(Box::new(file)));
        Some(path)
    } else {
        builder.target(Target::Pipe(Box::new(io::sink())));
        None
    };

    if builder.try_init().is_ok() {
        log::info!(
            "Logging initialized: level={}, file={}",
            config.level,
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_without_file_returns_no_path() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            file: false,
        };
        assert_eq!(init_logging(&config).unwrap(), None);
        // Second call must not panic
        assert_eq!(init_logging(&config).unwrap(), None);
    }
}
