//! Diagnostic logging via `tracing`.
//!
//! Console diagnostics go to stderr so report output on stdout stays clean.
//! An optional log file receives events without ANSI escapes and is always
//! opened in append mode. The file records at `info` or finer regardless of
//! the console level, so every run leaves a trace in it.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Environment variable that overrides the level derived from flags.
pub const LOG_ENV: &str = "SPINTOOLS_LOG";

/// Logging options collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub debug: bool,
    pub color: bool,
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Level directive implied by `-v`/`-d`.
    pub fn level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(config.level()))
}

/// Level for the log file layer: `debug` with `-d`, otherwise `info`.
fn file_level(config: &LoggingConfig) -> LevelFilter {
    if config.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// install is ignored.
pub fn init_logging(config: &LoggingConfig) -> io::Result<()> {
    let console = fmt::layer()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_ansi(config.color)
        .with_writer(io::stderr)
        .with_filter(build_env_filter(config));

    let file_layer = match config.file.as_ref() {
        Some(path) => {
            let file = open_log_file(path)?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .with_filter(file_level(config)),
            )
        }
        None => None,
    };

    let _ = Registry::default().with(console).with(file_layer).try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_level_follows_flags() {
        let mut cfg = LoggingConfig::default();
        assert_eq!(cfg.level(), "warn");
        cfg.verbose = true;
        assert_eq!(cfg.level(), "info");
        cfg.debug = true;
        assert_eq!(cfg.level(), "debug");
    }

    #[test]
    fn test_file_level_records_info_without_flags() {
        let mut cfg = LoggingConfig::default();
        assert_eq!(file_level(&cfg), LevelFilter::INFO);
        cfg.verbose = true;
        assert_eq!(file_level(&cfg), LevelFilter::INFO);
        cfg.debug = true;
        assert_eq!(file_level(&cfg), LevelFilter::DEBUG);
    }

    #[test]
    fn test_log_file_parent_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs/nested/run.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
