//! Canonical re-emission of a theme document.
//!
//! Output is fully determined by the parsed content:
//! - top-level keys in a fixed order, absent ones omitted;
//! - `colors` sorted by scope;
//! - `tokenColors` rebuilt from the original rule groupings, scopes sorted
//!   within each rule and rules sorted by their scope lists;
//! - `semanticTokenColors` with plain scopes first, wildcard scopes after,
//!   each pass sorted.
//!
//! Rewriting a rewritten file yields the same bytes.

use super::{Result, StagedTokenRule, ThemeIndex};
use crate::error::ThemeError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value as Json};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const SETTINGS_ORDER: [&str; 3] = ["foreground", "background", "fontStyle"];

fn sorted_map(map: &Map<String, Json>) -> Map<String, Json> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    let mut out = Map::new();
    for k in keys {
        out.insert(k.clone(), map[k.as_str()].clone());
    }
    out
}

fn canonical_settings(settings: &Map<String, Json>) -> Map<String, Json> {
    let mut out = Map::new();
    for key in SETTINGS_ORDER {
        if let Some(v) = settings.get(key) {
            out.insert(key.to_string(), v.clone());
        }
    }
    let mut rest: Vec<&String> = settings
        .keys()
        .filter(|k| !SETTINGS_ORDER.contains(&k.as_str()))
        .collect();
    rest.sort();
    for k in rest {
        out.insert(k.clone(), settings[k.as_str()].clone());
    }
    out
}

fn canonical_rule(rule: &StagedTokenRule, scopes: &[String]) -> Json {
    let mut obj = Map::new();
    if let Some(name) = rule.name.as_ref() {
        obj.insert("name".into(), name.clone());
    }
    match scopes.len() {
        0 => {}
        1 => {
            obj.insert("scope".into(), Json::String(scopes[0].clone()));
        }
        _ => {
            obj.insert(
                "scope".into(),
                Json::Array(scopes.iter().cloned().map(Json::String).collect()),
            );
        }
    }
    obj.insert("settings".into(), Json::Object(canonical_settings(&rule.settings)));
    for (k, v) in sorted_map(&rule.extra) {
        obj.insert(k, v);
    }
    Json::Object(obj)
}

fn canonical_token_rules(rules: &[StagedTokenRule]) -> Vec<Json> {
    let mut staged: Vec<(Vec<String>, &StagedTokenRule)> = rules
        .iter()
        .map(|r| {
            let mut scopes = r.scopes.clone();
            scopes.sort();
            scopes.dedup();
            (scopes, r)
        })
        .collect();
    // stable: rules with equal scope lists keep source order
    staged.sort_by(|a, b| a.0.cmp(&b.0));
    staged
        .iter()
        .map(|(scopes, rule)| canonical_rule(rule, scopes))
        .collect()
}

fn canonical_semantic(map: &Map<String, Json>) -> Map<String, Json> {
    let mut plain: Vec<&String> = map.keys().filter(|k| !k.contains('*')).collect();
    let mut wild: Vec<&String> = map.keys().filter(|k| k.contains('*')).collect();
    plain.sort();
    wild.sort();
    let mut out = Map::new();
    for k in plain.into_iter().chain(wild) {
        out.insert(k.clone(), map[k.as_str()].clone());
    }
    out
}

/// Build the canonical document for `index`.
pub fn canonical_document(index: &ThemeIndex) -> Json {
    let mut top = Map::new();
    if let Some(v) = index.schema.as_ref() {
        top.insert("$schema".into(), v.clone());
    }
    if let Some(v) = index.name.as_ref() {
        top.insert("name".into(), v.clone());
    }
    if let Some(v) = index.semantic_highlighting.as_ref() {
        top.insert("semanticHighlighting".into(), v.clone());
    }
    if let Some(v) = index.kind.as_ref() {
        top.insert("type".into(), v.clone());
    }
    if let Some(colors) = index.colors.as_ref() {
        top.insert("colors".into(), Json::Object(sorted_map(colors)));
    }
    if let Some(rules) = index.token_rules.as_ref() {
        top.insert("tokenColors".into(), Json::Array(canonical_token_rules(rules)));
    }
    if let Some(sem) = index.semantic.as_ref() {
        top.insert("semanticTokenColors".into(), Json::Object(canonical_semantic(sem)));
    }
    for (k, v) in sorted_map(&index.extra) {
        top.insert(k, v);
    }
    Json::Object(top)
}

/// Render the canonical document as 4-space indented JSON with a final newline.
pub fn render_canonical(index: &ThemeIndex) -> String {
    let doc = canonical_document(index);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    // serializing a Value into a Vec cannot fail
    let _ = doc.serialize(&mut ser);
    let mut s = String::from_utf8_lossy(&buf).into_owned();
    s.push('\n');
    s
}

/// First free `<stem>-NNN.<ext>` sibling of `input`, trying 1..=`slots`.
pub fn next_rewrite_path(input: &Path, slots: u32) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "theme".to_string());
    let ext = input.extension().map(|e| e.to_string_lossy().to_string());
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    for n in 1..=slots {
        let name = match ext.as_deref() {
            Some(e) => format!("{}-{:03}.{}", stem, n, e),
            None => format!("{}-{:03}", stem, n),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(ThemeError::RewriteSlotsExhausted {
        path: input.to_path_buf(),
        limit: slots,
    })
}

/// Write the canonical copy next to the source. Never overwrites: the
/// target is created exclusively.
pub fn write_rewrite(index: &ThemeIndex, slots: u32) -> Result<PathBuf> {
    let target = next_rewrite_path(&index.source, slots)?;
    let body = render_canonical(index);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
        .map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                tracing::warn!(target = %target.display(), "rewrite target appeared concurrently");
            }
            ThemeError::io(&target, e)
        })?;
    file.write_all(body.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| ThemeError::io(&target, e))?;
    tracing::info!(target = %target.display(), "wrote canonical theme");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const THEME: &str = r##"{
  // out of order on purpose
  "tokenColors": [
    { "scope": ["string", "constant.numeric", "comment.line", "comment.block", "keyword"], "settings": { "fontStyle": "bold", "foreground": "#0000ff" } },
    { "name": "Comments", "scope": "comment", "settings": { "foreground": "#008000" } },
    { "settings": { "foreground": "#000000", "background": "#ffffff" } }
  ],
  "type": "light",
  "colors": { "editor.foreground": "#000000", "editor.background": "#ffffff" },
  "semanticTokenColors": { "*.static": { "fontStyle": "italic" }, "variable": "#001080", "*.readonly": "#4a4aff", "enumMember": "#0070c1" },
  "name": "Spin2 Light",
  "semanticHighlighting": true,
  "$schema": "vscode://schemas/color-theme"
}"##;

    fn parse(text: &str, path: &Path) -> ThemeIndex {
        ThemeIndex::parse_str(text, path).unwrap()
    }

    #[test]
    fn test_top_level_order_and_sections() {
        let idx = parse(THEME, Path::new("t.json"));
        let doc = canonical_document(&idx);
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            vec![
                "$schema",
                "name",
                "semanticHighlighting",
                "type",
                "colors",
                "tokenColors",
                "semanticTokenColors"
            ]
        );
        let colors: Vec<&String> = doc["colors"].as_object().unwrap().keys().collect();
        assert_eq!(colors, vec!["editor.background", "editor.foreground"]);
        let sem: Vec<&String> = doc["semanticTokenColors"].as_object().unwrap().keys().collect();
        assert_eq!(sem, vec!["enumMember", "variable", "*.readonly", "*.static"]);
    }

    #[test]
    fn test_multi_scope_rules_stay_grouped() {
        let idx = parse(THEME, Path::new("t.json"));
        let doc = canonical_document(&idx);
        let rules = doc["tokenColors"].as_array().unwrap();
        assert_eq!(rules.len(), 3);
        // scope-less rule sorts first
        assert!(rules[0].get("scope").is_none());
        let settings: Vec<&String> = rules[0]["settings"].as_object().unwrap().keys().collect();
        assert_eq!(settings, vec!["foreground", "background"]);
        assert_eq!(rules[1]["name"], "Comments");
        assert_eq!(rules[1]["scope"], "comment");
        assert_eq!(
            rules[2]["scope"],
            serde_json::json!(["comment.block", "comment.line", "constant.numeric", "keyword", "string"])
        );
        let settings: Vec<&String> = rules[2]["settings"].as_object().unwrap().keys().collect();
        assert_eq!(settings, vec!["foreground", "fontStyle"]);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let first = render_canonical(&parse(THEME, Path::new("t.json")));
        let second = render_canonical(&parse(&first, Path::new("t-001.json")));
        assert_eq!(first, second);
        assert!(first.ends_with("}\n"));
        assert!(first.contains("\n    \"name\": \"Spin2 Light\","));
    }

    #[test]
    fn test_absent_keys_are_omitted() {
        let idx = parse(r##"{"colors": {"a": "#111"}}"##, Path::new("t.json"));
        let doc = canonical_document(&idx);
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["colors"]);
    }

    #[test]
    fn test_rewrite_naming_sequence() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("theme.json");
        fs::write(&src, THEME).unwrap();
        let idx = ThemeIndex::parse_str(THEME, &src).unwrap();

        let first = write_rewrite(&idx, 10).unwrap();
        assert_eq!(first, dir.path().join("theme-001.json"));
        let second = write_rewrite(&idx, 10).unwrap();
        assert_eq!(second, dir.path().join("theme-002.json"));
        assert_eq!(fs::read_to_string(&src).unwrap(), THEME);
        assert_eq!(
            fs::read_to_string(&first).unwrap(),
            fs::read_to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_exhausted_slots_report_error_and_write_nothing() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("theme.json");
        fs::write(&src, THEME).unwrap();
        for n in 1..=10 {
            fs::write(dir.path().join(format!("theme-{:03}.json", n)), "{}").unwrap();
        }
        let idx = ThemeIndex::parse_str(THEME, &src).unwrap();
        let err = write_rewrite(&idx, 10).unwrap_err();
        assert!(matches!(err, ThemeError::RewriteSlotsExhausted { limit: 10, .. }));
        assert!(!dir.path().join("theme-011.json").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 11);
    }
}
