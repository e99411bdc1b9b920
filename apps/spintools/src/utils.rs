//! Console helpers: colored message prefixes and path display.

use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

static COLOR_DISABLED: AtomicBool = AtomicBool::new(false);

/// Force plain output for the rest of the process (`-a/--ansii`).
pub fn disable_colors() {
    COLOR_DISABLED.store(true, Ordering::Relaxed);
}

/// True unless colors were disabled on the command line or via `NO_COLOR`.
pub fn colors_enabled() -> bool {
    !COLOR_DISABLED.load(Ordering::Relaxed) && std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "⟦error⟧".red().bold().to_string()
    } else {
        "⟦error⟧".to_string()
    }
}

pub fn warn_prefix() -> String {
    if colors_enabled() {
        "⟦warn⟧".yellow().bold().to_string()
    } else {
        "⟦warn⟧".to_string()
    }
}

pub fn info_prefix() -> String {
    if colors_enabled() {
        "⟦info⟧".green().bold().to_string()
    } else {
        "⟦info⟧".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "⟦note⟧".blue().bold().to_string()
    } else {
        "⟦note⟧".to_string()
    }
}

/// Display `p` relative to the working directory when possible.
pub fn rel_to_wd(p: &Path) -> String {
    let cwd = match std::env::current_dir() {
        Ok(c) => c,
        Err(_) => return p.to_string_lossy().to_string(),
    };
    match pathdiff::diff_paths(p, &cwd) {
        Some(rel) if !rel.as_os_str().is_empty() && !rel.starts_with("..") => {
            rel.to_string_lossy().to_string()
        }
        _ => p.to_string_lossy().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_to_wd_keeps_outside_paths_absolute() {
        let outside = std::env::temp_dir().join("spintools-outside.txt");
        let shown = rel_to_wd(&outside);
        assert!(shown.ends_with("spintools-outside.txt"));
    }
}
