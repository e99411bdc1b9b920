//! Configuration discovery and effective settings resolution.
//!
//! Both tools read `spintools.toml|yaml|yml` from the working directory (or
//! the closest ancestor) and merge it with CLI flags to produce an effective
//! config per tool. Defaults:
//! - `certify.extensions`: `["spin", "spin2"]`
//! - `certify.root_alias`: `All`
//! - `theme.output`: `human`
//! - `theme.log_dir`: `./logs`
//! - `theme.rewrite_slots`: 10
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSIONS: [&str; 2] = ["spin", "spin2"];
pub const DEFAULT_ROOT_ALIAS: &str = "All";
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_REWRITE_SLOTS: u32 = 10;

const CONFIG_NAMES: [&str; 3] = ["spintools.toml", "spintools.yaml", "spintools.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Certifier section under `[certify]`.
pub struct CertifyCfg {
    pub outfile: Option<String>,
    pub rootdir: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub root_alias: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Theme checker section under `[theme]`.
pub struct ThemeCfg {
    pub output: Option<String>,
    pub log_dir: Option<String>,
    pub rewrite_slots: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `spintools.toml|yaml`.
pub struct ToolsConfig {
    #[serde(default)]
    pub certify: Option<CertifyCfg>,
    #[serde(default)]
    pub theme: Option<ThemeCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved certifier settings.
pub struct CertifyEffective {
    pub outfile: PathBuf,
    pub rootdir: PathBuf,
    pub fromfile: Option<PathBuf>,
    pub extensions: Vec<String>,
    pub root_alias: String,
}

#[derive(Debug, Clone)]
/// Fully-resolved theme checker settings.
pub struct ThemeEffective {
    pub theme: Option<PathBuf>,
    pub output: String,
    pub log_file: Option<PathBuf>,
    pub rewrite_slots: u32,
}

/// Walk upward from `start` looking for a config file.
///
/// Stops at the first directory holding a `spintools.*` file or a `.git`
/// directory; returns `None` when neither is found.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = start;
    loop {
        for name in CONFIG_NAMES {
            let p = cur.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
        if cur.join(".git").exists() {
            return None;
        }
        cur = cur.parent()?;
    }
}

/// Load a config file, choosing the parser from the extension.
pub fn load_config_file(path: &Path) -> Result<ToolsConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&s).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(&s).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load the explicit config when given, otherwise the discovered one, or defaults.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<ToolsConfig, ConfigError> {
    match explicit {
        Some(p) => load_config_file(p),
        None => match find_config(start) {
            Some(p) => {
                tracing::debug!(config = %p.display(), "using discovered config");
                load_config_file(&p)
            }
            None => Ok(ToolsConfig::default()),
        },
    }
}

/// Resolve certifier settings. Missing outfile/rootdir after merging is a
/// usage error.
pub fn resolve_certify(
    cfg: &ToolsConfig,
    cli_outfile: Option<&str>,
    cli_rootdir: Option<&str>,
    cli_fromfile: Option<&str>,
) -> Result<CertifyEffective, ConfigError> {
    let sect = cfg.certify.clone().unwrap_or_default();
    let outfile = cli_outfile
        .map(|s| s.to_string())
        .or(sect.outfile)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ConfigError::Missing("need output filename, missing -o directive".to_string())
        })?;
    let rootdir = cli_rootdir
        .map(|s| s.to_string())
        .or(sect.rootdir)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ConfigError::Missing("need top folder name to list, missing -r directive".to_string())
        })?;
    let extensions = sect
        .extensions
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect())
        .into_iter()
        .map(|e| e.trim_start_matches('.').to_string())
        .collect();
    let root_alias = sect
        .root_alias
        .unwrap_or_else(|| DEFAULT_ROOT_ALIAS.to_string());
    Ok(CertifyEffective {
        outfile: PathBuf::from(outfile),
        rootdir: PathBuf::from(rootdir),
        fromfile: cli_fromfile.filter(|s| !s.is_empty()).map(PathBuf::from),
        extensions,
        root_alias,
    })
}

/// Resolve theme checker settings.
pub fn resolve_theme(
    cfg: &ToolsConfig,
    cli_theme: Option<&str>,
    cli_output: Option<&str>,
    cli_log_filename: Option<&str>,
) -> Result<ThemeEffective, ConfigError> {
    let sect = cfg.theme.clone().unwrap_or_default();
    let output = cli_output
        .map(|s| s.to_string())
        .or(sect.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(ConfigError::Invalid {
            key: "output mode",
            value: output,
            expected: "human|json",
        });
    }
    let log_dir = sect.log_dir.unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());
    let log_file = cli_log_filename
        .filter(|s| !s.is_empty())
        .map(|name| Path::new(&log_dir).join(name));
    Ok(ThemeEffective {
        theme: cli_theme.filter(|s| !s.is_empty()).map(PathBuf::from),
        output,
        log_file,
        rewrite_slots: sect.rewrite_slots.unwrap_or(DEFAULT_REWRITE_SLOTS).max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("spintools.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
[certify]
outfile = "cert.txt"
rootdir = "src"
extensions = [".spin2"]

[theme]
output = "json"
rewrite_slots = 3
    "#
        )
        .unwrap();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let cfg = load_config(None, &nested).unwrap();
        let eff = resolve_certify(&cfg, None, None, None).unwrap();
        assert_eq!(eff.outfile, PathBuf::from("cert.txt"));
        assert_eq!(eff.rootdir, PathBuf::from("src"));
        assert_eq!(eff.extensions, vec!["spin2".to_string()]);
        assert_eq!(eff.root_alias, "All");

        let th = resolve_theme(&cfg, None, None, None).unwrap();
        assert_eq!(th.output, "json");
        assert_eq!(th.rewrite_slots, 3);
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        let mut f = fs::File::create(root.join("spintools.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
theme:
  log_dir: ./diag
            "#
        )
        .unwrap();

        let cfg = load_config(None, root).unwrap();
        let th = resolve_theme(&cfg, Some("t.json"), None, Some("run.log")).unwrap();
        assert_eq!(th.output, "human");
        assert_eq!(th.rewrite_slots, DEFAULT_REWRITE_SLOTS);
        assert_eq!(th.log_file, Some(PathBuf::from("./diag/run.log")));
        assert_eq!(th.theme, Some(PathBuf::from("t.json")));
    }

    #[test]
    fn test_cli_takes_precedence_over_config() {
        let cfg = ToolsConfig {
            certify: Some(CertifyCfg {
                outfile: Some("from-config.txt".into()),
                rootdir: Some("cfg-root".into()),
                extensions: None,
                root_alias: Some("Top".into()),
            }),
            theme: None,
        };
        let eff = resolve_certify(&cfg, Some("cli.txt"), None, Some("prior.txt")).unwrap();
        assert_eq!(eff.outfile, PathBuf::from("cli.txt"));
        assert_eq!(eff.rootdir, PathBuf::from("cfg-root"));
        assert_eq!(eff.fromfile, Some(PathBuf::from("prior.txt")));
        assert_eq!(eff.root_alias, "Top");
        assert_eq!(eff.extensions, vec!["spin", "spin2"]);
    }

    #[test]
    fn test_missing_required_certify_flags() {
        let cfg = ToolsConfig::default();
        let err = resolve_certify(&cfg, None, Some("root"), None).unwrap_err();
        assert!(err.to_string().contains("-o"));
        let err = resolve_certify(&cfg, Some("out.txt"), None, None).unwrap_err();
        assert!(err.to_string().contains("-r"));
    }

    #[test]
    fn test_discovery_stops_at_git_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let repo = root.join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::write(root.join("spintools.toml"), "[theme]\noutput = \"json\"\n").unwrap();
        assert!(find_config(&repo).is_none());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("spintools.toml");
        fs::write(&p, "[certify\n").unwrap();
        assert!(matches!(
            load_config(Some(&p), dir.path()),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn test_unknown_output_mode_rejected() {
        let cfg = ToolsConfig::default();
        match resolve_theme(&cfg, None, Some("xml"), None) {
            Err(ConfigError::Invalid { key, value, .. }) => {
                assert_eq!(key, "output mode");
                assert_eq!(value, "xml");
            }
            other => panic!("expected invalid output mode, got {:?}", other.map(|e| e.output)),
        }
    }
}
