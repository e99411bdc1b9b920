//! Error types shared by the certifier, the theme checker, and config loading.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config {path} is not valid TOML: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config {path} is not valid YAML: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("{0}")]
    Missing(String),
    #[error("invalid {key} '{value}' (expected {expected})")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum CertifyError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("root directory not found: {0}")]
    RootNotFound(PathBuf),
    #[error("marks file lists directory '{key}' more than once (lines {first} and {second})")]
    AmbiguousMarks {
        key: String,
        first: usize,
        second: usize,
    },
}

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("theme {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("theme {path}: {message}")]
    Shape { path: PathBuf, message: String },
    #[error("no free rewrite name for {path}: {limit} candidates already exist")]
    RewriteSlotsExhausted { path: PathBuf, limit: u32 },
}

impl CertifyError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CertifyError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code used by the binary for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CertifyError::AmbiguousMarks { .. } => 3,
            CertifyError::RootNotFound(_) => 2,
            CertifyError::Io { .. } => 1,
        }
    }
}

impl ThemeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ThemeError::Io {
            path: path.into(),
            source,
        }
    }
}
