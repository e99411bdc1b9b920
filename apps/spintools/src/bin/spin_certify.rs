//! spin-certify binary entry point.
//! Resolves config, scans the tree, and writes the certification report.

use clap::Parser;
use spintools::certify::marks::MarkTable;
use spintools::certify::report::{self, ReportWriter};
use spintools::certify::Certifier;
use spintools::cli::CertifyCli;
use spintools::{config, logging, utils};
use std::fs;
use std::path::{Path, PathBuf};

fn fail(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", utils::error_prefix(), message);
    std::process::exit(code);
}

fn main() {
    let cli = CertifyCli::parse();
    let log_cfg = logging::LoggingConfig {
        verbose: cli.verbose,
        debug: cli.debug,
        color: utils::colors_enabled(),
        file: None,
    };
    if let Err(e) = logging::init_logging(&log_cfg) {
        eprintln!("{} logging disabled: {}", utils::note_prefix(), e);
    }
    tracing::info!("spin-certify v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("debug enabled");

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let cfg = match config::load_config(cli.config.as_deref().map(Path::new), &cwd) {
        Ok(c) => c,
        Err(e) => fail(2, e),
    };
    let eff = match config::resolve_certify(
        &cfg,
        cli.outfile.as_deref(),
        cli.rootdir.as_deref(),
        cli.fromfile.as_deref(),
    ) {
        Ok(e) => e,
        Err(e) => fail(2, e),
    };

    // Marks are parsed before the report file exists so an ambiguous marks
    // file leaves nothing behind.
    let marks = match eff.fromfile.as_ref() {
        Some(p) => {
            let text = match fs::read_to_string(p) {
                Ok(t) => t,
                Err(e) => fail(1, format!("unable to read marks file {}: {}", p.display(), e)),
            };
            match MarkTable::parse(&text) {
                Ok(m) => {
                    tracing::info!(directories = m.directory_count(), "loaded marks from {}", p.display());
                    Some(m)
                }
                Err(e) => fail(e.exit_code(), e),
            }
        }
        None => None,
    };

    let mut certifier = Certifier::new(&eff.extensions, &eff.root_alias);
    if let Err(e) = certifier.scan(&eff.rootdir) {
        fail(e.exit_code(), e);
    }

    let out = match fs::File::create(&eff.outfile) {
        Ok(f) => f,
        Err(e) => fail(1, format!("unable to create {}: {}", eff.outfile.display(), e)),
    };
    let mut writer = ReportWriter::new(out, &eff.outfile);
    if let Err(e) = report::write_report(&certifier, &eff.rootdir, marks.as_ref(), &mut writer) {
        fail(e.exit_code(), e);
    }
    drop(writer);

    println!(
        "{} {} directories, {} unique filenames, {} unique contents -> {}",
        utils::info_prefix(),
        certifier.directories().len(),
        certifier.distinct_names(),
        certifier.distinct_hashes(),
        utils::rel_to_wd(&eff.outfile)
    );
}
