//! CLI argument parsing via `clap` for both binaries.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "spin-certify",
    version,
    about = "Make list of spin/spin2 files for certification",
    long_about = "Walk a directory tree, fingerprint every .spin/.spin2 file, and write a tab-indented certification report.\n\nConfiguration precedence: CLI > spintools.toml > defaults.",
    after_help = "Examples:\n  spin-certify -r ./All -o certify.txt\n  spin-certify -r ./All -o certify-new.txt -f certify.txt -v"
)]
/// Options for the directory certifier.
pub struct CertifyCli {
    #[arg(short = 'o', long, help = "Output report file (required)")]
    pub outfile: Option<String>,
    #[arg(short = 'r', long, help = "Root directory to scan (required)")]
    pub rootdir: Option<String>,
    #[arg(short = 'f', long, help = "Prior report to carry @done marks and notes from")]
    pub fromfile: Option<String>,
    #[arg(long, help = "Explicit config file (default: discover spintools.toml)")]
    pub config: Option<String>,
    #[arg(short = 'v', long, action = clap::ArgAction::SetTrue, help = "Increase output verbosity")]
    pub verbose: bool,
    #[arg(short = 'd', long, action = clap::ArgAction::SetTrue, help = "Show debug output")]
    pub debug: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "theme-check",
    version,
    about = "Theme-check utility",
    long_about = "Parse a VS Code color theme (JSON with comments), report scopes bound to more than one color, and optionally write a canonical copy.",
    after_help = "Examples:\n  theme-check -t spin2-light.color-theme.json\n  theme-check -t spin2-light.color-theme.json -r\n  theme-check -t theme.json -s -e --output json"
)]
/// Options for the theme checker.
pub struct ThemeCli {
    #[arg(short = 't', long = "theme_filename", help = "Process (t)heme file")]
    pub theme_filename: Option<String>,
    #[arg(short = 'r', long, action = clap::ArgAction::SetTrue, help = "Write a canonical copy as <name>-NNN.json")]
    pub rewrite: bool,
    #[arg(short = 'e', long, action = clap::ArgAction::SetTrue, help = "Dump entries grouped by section then color")]
    pub emit: bool,
    #[arg(short = 's', long, action = clap::ArgAction::SetTrue, help = "List raw scopes with occurrence counts")]
    pub scopes: bool,
    #[arg(short = 'l', long = "log_filename", help = "Append diagnostics to <log_dir>/<LOG_FILENAME>")]
    pub log_filename: Option<String>,
    #[arg(short = 'a', long, action = clap::ArgAction::SetTrue, help = "Disable ANSI colors")]
    pub ansii: bool,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Explicit config file (default: discover spintools.toml)")]
    pub config: Option<String>,
    #[arg(short = 'v', long, action = clap::ArgAction::SetTrue, help = "Increase output (v)erbosity")]
    pub verbose: bool,
    #[arg(short = 'd', long, action = clap::ArgAction::SetTrue, help = "Show (d)ebug output")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certify_short_flags() {
        let cli = CertifyCli::try_parse_from(["spin-certify", "-o", "out.txt", "-r", "All", "-f", "old.txt", "-v"]).unwrap();
        assert_eq!(cli.outfile.as_deref(), Some("out.txt"));
        assert_eq!(cli.rootdir.as_deref(), Some("All"));
        assert_eq!(cli.fromfile.as_deref(), Some("old.txt"));
        assert!(cli.verbose);
        assert!(!cli.debug);
    }

    #[test]
    fn test_theme_long_flags_use_underscores() {
        let cli = ThemeCli::try_parse_from([
            "theme-check",
            "--theme_filename",
            "t.json",
            "--log_filename",
            "run.log",
            "-r",
            "-a",
        ])
        .unwrap();
        assert_eq!(cli.theme_filename.as_deref(), Some("t.json"));
        assert_eq!(cli.log_filename.as_deref(), Some("run.log"));
        assert!(cli.rewrite);
        assert!(cli.ansii);
        assert!(!cli.emit);
    }
}
