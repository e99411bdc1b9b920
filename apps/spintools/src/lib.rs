//! spintools core library.
//!
//! Support utilities for the Spin/Spin2 editor tooling:
//! - `certify`: directory walk, content fingerprints, certification report,
//!   and the marks reader for carrying annotations between reports.
//! - `theme`: JSONC theme parsing, color consistency check, canonical rewrite.
//!
//! Shared plumbing:
//! - `cli`: CLI argument parsing (binaries use this).
//! - `config`: Discovery and effective configuration resolution.
//! - `error`: Error enums per tool.
//! - `logging`: `tracing` subscriber setup.
//! - `output`: Human/JSON printers for theme results.
//! - `utils`: Console prefixes and path helpers.
pub mod certify;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod theme;
pub mod utils;
