//! Output rendering for theme checks, scope lists, and entry dumps.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-item fields and a top-level summary.

use crate::theme::check::{CheckReport, ScopeConflict};
use crate::theme::Section;
use crate::utils;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::collections::BTreeMap;

fn use_colors(output: &str) -> bool {
    output != "json" && utils::colors_enabled()
}

fn print_json(value: &JsonVal) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} {}", utils::error_prefix(), e),
    }
}

/// Print consistency-check results in the requested format.
pub fn print_check(res: &CheckReport, output: &str) {
    match output {
        "json" => print_json(&compose_check_json(res)),
        _ => {
            let color = use_colors(output);
            let file = if color {
                res.file.clone().bold().to_string()
            } else {
                res.file.clone()
            };
            println!("{} Checking all colors in {}", utils::info_prefix(), file);
            for c in &res.conflicts {
                let icon = if color {
                    "▲".yellow().to_string()
                } else {
                    "▲".to_string()
                };
                println!("{} {} DUPE color scope: {}", icon, utils::warn_prefix(), c.scope);
                for line in compose_conflict_lines(c) {
                    println!("{}", line);
                }
            }
            if res.conflicts.is_empty() {
                println!(
                    "{} NO DUPE color entries: no duplicate entries found",
                    utils::info_prefix()
                );
            }
            let summary = format!(
                "— Summary — scopes={} colors={} bindings={} conflicts={} self_conflicts={}",
                res.summary.scopes,
                res.summary.colors,
                res.summary.bindings,
                res.summary.conflicts,
                res.summary.self_conflicts
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print every scope with the number of bindings naming it.
pub fn print_scopes(counts: &BTreeMap<String, usize>, output: &str) {
    match output {
        "json" => print_json(&compose_scopes_json(counts)),
        _ => {
            println!("{} {} scopes", utils::info_prefix(), counts.len());
            for (scope, n) in counts {
                println!("    {:>3}x {}", n, scope);
            }
        }
    }
}

/// Print entries grouped by section, then color.
pub fn print_entries(grouped: &BTreeMap<Section, BTreeMap<String, Vec<String>>>, output: &str) {
    match output {
        "json" => print_json(&compose_entries_json(grouped)),
        _ => {
            let color = use_colors(output);
            for (section, colors) in grouped {
                if color {
                    println!("{} {}", "---".cyan().bold(), section.as_str().bold());
                } else {
                    println!("--- {}", section);
                }
                for (value, scopes) in colors {
                    println!("  - color: {}", value);
                    for scope in scopes {
                        println!("    -- {}", scope);
                    }
                }
            }
        }
    }
}

/// Print where a canonical copy was written.
pub fn print_rewrite(target: &str, output: &str) {
    match output {
        "json" => print_json(&json!({ "rewrite": target })),
        _ => {
            if use_colors(output) {
                println!("{} {}", "✏️  rewrote:".green().bold(), target.bold());
            } else {
                println!("✏️  rewrote: {}", target);
            }
        }
    }
}

/// Detail lines printed under one DUPE group: every color with the
/// sections using it, then any rebinding inside a single section.
pub fn compose_conflict_lines(c: &ScopeConflict) -> Vec<String> {
    let mut lines: Vec<String> = c
        .colors
        .iter()
        .map(|cc| {
            let sections: Vec<&str> = cc.sections.iter().map(Section::as_str).collect();
            format!("    -- color: {} [{}]", cc.color, sections.join(", "))
        })
        .collect();
    for sc in &c.rebound {
        lines.push(format!(
            "    -- rebound within {}: {} -> {} (last wins)",
            sc.section, sc.previous, sc.current
        ));
    }
    lines
}

/// Compose check JSON object (pure) for testing/snapshot purposes.
pub fn compose_check_json(res: &CheckReport) -> JsonVal {
    serde_json::to_value(res).unwrap_or(JsonVal::Null)
}

pub fn compose_scopes_json(counts: &BTreeMap<String, usize>) -> JsonVal {
    let items: Vec<_> = counts
        .iter()
        .map(|(scope, n)| json!({ "scope": scope, "count": n }))
        .collect();
    json!({ "scopes": items, "summary": { "total": counts.len() } })
}

pub fn compose_entries_json(grouped: &BTreeMap<Section, BTreeMap<String, Vec<String>>>) -> JsonVal {
    let mut out = serde_json::Map::new();
    for (section, colors) in grouped {
        out.insert(section.as_str().to_string(), json!(colors));
    }
    JsonVal::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::check::{check_consistency, entries_by_section, scope_counts};
    use crate::theme::ThemeIndex;
    use std::path::Path;

    fn index() -> ThemeIndex {
        ThemeIndex::parse_str(
            r##"{
  "colors": { "comment": "#888888" },
  "tokenColors": [ { "scope": ["comment", "string"], "settings": { "foreground": "#888888", "fontStyle": "italic" } } ]
}"##,
            Path::new("theme.json"),
        )
        .unwrap()
    }

    #[test]
    fn test_compose_check_json_shape() {
        let out = compose_check_json(&check_consistency(&index()));
        assert_eq!(out["file"], "theme.json");
        assert_eq!(out["summary"]["conflicts"], 1);
        assert_eq!(out["conflicts"][0]["scope"], "comment");
        assert_eq!(out["conflicts"][0]["colors"][1]["color"], "#888888 italic");
        assert_eq!(out["conflicts"][0]["colors"][1]["sections"][0], "tokenColors");
    }

    #[test]
    fn test_rebinding_is_listed_inside_its_dupe_group() {
        let idx = ThemeIndex::parse_str(
            r##"{
  "tokenColors": [
    { "scope": "keyword", "settings": { "foreground": "#111111" } },
    { "scope": "keyword", "settings": { "foreground": "#222222" } }
  ]
}"##,
            Path::new("theme.json"),
        )
        .unwrap();
        let res = check_consistency(&idx);
        assert_eq!(res.conflicts.len(), 1);
        let lines = compose_conflict_lines(&res.conflicts[0]);
        assert_eq!(
            lines,
            vec![
                "    -- color: #111111 [tokenColors]",
                "    -- color: #222222 [tokenColors]",
                "    -- rebound within tokenColors: #111111 -> #222222 (last wins)",
            ]
        );
        let out = compose_check_json(&res);
        assert_eq!(out["conflicts"][0]["rebound"][0]["current"], "#222222");
        assert!(out.get("self_conflicts").is_none());
    }

    #[test]
    fn test_compose_scopes_and_entries_json() {
        let idx = index();
        let scopes = compose_scopes_json(&scope_counts(&idx));
        assert_eq!(scopes["summary"]["total"], 2);
        assert_eq!(scopes["scopes"][0]["scope"], "comment");
        assert_eq!(scopes["scopes"][0]["count"], 2);
        let entries = compose_entries_json(&entries_by_section(&idx));
        assert_eq!(entries["tokenColors"]["#888888 italic"][1], "string");
        assert_eq!(entries["colors"]["#888888"][0], "comment");
    }
}
