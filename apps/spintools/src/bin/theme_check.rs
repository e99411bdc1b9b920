//! theme-check binary entry point.
//! Parses a theme, always runs the consistency check, then handles the
//! optional scope list, entry dump, and canonical rewrite.

use clap::Parser;
use spintools::cli::ThemeCli;
use spintools::error::ThemeError;
use spintools::theme::{check, load_theme, rewrite};
use spintools::{config, logging, output, utils};
use std::path::{Path, PathBuf};

fn fail(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", utils::error_prefix(), message);
    std::process::exit(code);
}

fn main() {
    let cli = ThemeCli::parse();
    if cli.ansii {
        utils::disable_colors();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let cfg = match config::load_config(cli.config.as_deref().map(Path::new), &cwd) {
        Ok(c) => c,
        Err(e) => fail(2, e),
    };
    let eff = match config::resolve_theme(
        &cfg,
        cli.theme_filename.as_deref(),
        cli.output.as_deref(),
        cli.log_filename.as_deref(),
    ) {
        Ok(e) => e,
        Err(e) => fail(2, e),
    };

    let log_cfg = logging::LoggingConfig {
        verbose: cli.verbose,
        debug: cli.debug,
        color: utils::colors_enabled(),
        file: eff.log_file.clone(),
    };
    if let Err(e) = logging::init_logging(&log_cfg) {
        fail(1, format!("unable to open log file: {}", e));
    }
    tracing::info!("theme-check v{}", env!("CARGO_PKG_VERSION"));
    if let Some(log) = eff.log_file.as_ref() {
        tracing::info!(log = %log.display(), "log started");
        eprintln!("{} Writing log {}", utils::info_prefix(), log.display());
    }

    let theme_path = match eff.theme.as_ref() {
        Some(p) => p,
        None => {
            eprintln!(
                "{} No theme file given; pass -t/--theme_filename to check one.",
                utils::note_prefix()
            );
            return;
        }
    };

    let index = match load_theme(theme_path) {
        Ok(i) => i,
        Err(e) => fail(1, e),
    };
    tracing::info!("theme opened: {}", theme_path.display());

    let report = check::check_consistency(&index);
    output::print_check(&report, &eff.output);

    if cli.scopes {
        output::print_scopes(&check::scope_counts(&index), &eff.output);
    }
    if cli.emit {
        output::print_entries(&check::entries_by_section(&index), &eff.output);
    }
    if cli.rewrite {
        match rewrite::write_rewrite(&index, eff.rewrite_slots) {
            Ok(target) => output::print_rewrite(&utils::rel_to_wd(&target), &eff.output),
            Err(e @ ThemeError::RewriteSlotsExhausted { .. }) => {
                fail(1, format!("{}; remove old copies and retry", e))
            }
            Err(e) => fail(1, e),
        }
    }
}
