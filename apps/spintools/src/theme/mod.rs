//! Color-theme parsing and indexing.
//!
//! A theme document has three sections that bind editor scopes to colors:
//! - `colors`: flat `scope -> "#rrggbb"` map
//! - `tokenColors`: ordered rules, each binding one or more scopes to a
//!   shared `settings` block
//! - `semanticTokenColors`: `scope -> "#rrggbb"` or `scope -> {settings}`
//!
//! Parsing records every binding in a reverse index (color -> section ->
//! scopes) and keeps enough of the source shape (`StagedTokenRule`) for the
//! canonical rewrite to rebuild multi-scope rules.

pub mod check;
pub mod jsonc;
pub mod rewrite;

use crate::error::ThemeError;
use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, ThemeError>;

/// Theme section a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Section {
    #[serde(rename = "colors")]
    Colors,
    #[serde(rename = "tokenColors")]
    TokenColors,
    #[serde(rename = "semanticTokenColors")]
    SemanticTokenColors,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Colors => "colors",
            Section::TokenColors => "tokenColors",
            Section::SemanticTokenColors => "semanticTokenColors",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scope bound to one color entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeBinding {
    pub section: Section,
    pub scope: String,
    pub color: String,
}

/// A scope bound to different colors within the same section; the later
/// binding wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfConflict {
    pub section: Section,
    pub scope: String,
    pub previous: String,
    pub current: String,
}

/// A `tokenColors` rule as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedTokenRule {
    pub name: Option<Json>,
    pub scopes: Vec<String>,
    pub settings: Map<String, Json>,
    pub extra: Map<String, Json>,
}

/// color -> section -> scopes using that color.
pub type ReverseColorIndex = BTreeMap<String, BTreeMap<Section, BTreeSet<String>>>;

/// Parsed and indexed theme document.
#[derive(Debug, Clone, Default)]
pub struct ThemeIndex {
    pub source: PathBuf,
    pub schema: Option<Json>,
    pub name: Option<Json>,
    pub kind: Option<Json>,
    pub semantic_highlighting: Option<Json>,
    pub colors: Option<Map<String, Json>>,
    pub token_rules: Option<Vec<StagedTokenRule>>,
    pub semantic: Option<Map<String, Json>>,
    pub extra: Map<String, Json>,
    pub bindings: Vec<ScopeBinding>,
    pub reverse: ReverseColorIndex,
    pub self_conflicts: Vec<SelfConflict>,
    last_seen: HashMap<(Section, String), String>,
}

/// Effective color entry for a settings block: `foreground`, `fontStyle`,
/// or both joined by one space (foreground first).
pub fn color_entry(settings: &Map<String, Json>) -> Option<String> {
    let fg = settings.get("foreground").and_then(Json::as_str);
    let style = settings.get("fontStyle").and_then(Json::as_str);
    match (fg, style) {
        (Some(f), Some(s)) => Some(format!("{} {}", f, s)),
        (Some(f), None) => Some(f.to_string()),
        (None, Some(s)) => Some(s.to_string()),
        (None, None) => None,
    }
}

/// Read and index the theme at `path`.
pub fn load_theme(path: &Path) -> Result<ThemeIndex> {
    let text = fs::read_to_string(path).map_err(|e| ThemeError::io(path, e))?;
    ThemeIndex::parse_str(&text, path)
}

impl ThemeIndex {
    /// Parse JSONC `text`; `path` is used for error messages and rewrite naming.
    pub fn parse_str(text: &str, path: &Path) -> Result<ThemeIndex> {
        let strict = jsonc::strip_jsonc(text);
        let doc: Json = serde_json::from_str(&strict).map_err(|source| ThemeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let top = match doc {
            Json::Object(m) => m,
            _ => return Err(shape(path, "top level must be an object")),
        };

        let mut index = ThemeIndex {
            source: path.to_path_buf(),
            ..ThemeIndex::default()
        };
        for (key, value) in top {
            match key.as_str() {
                "$schema" | "name" | "type" | "semanticHighlighting" => {
                    tracing::debug!("- {}: {}", key, value);
                    match key.as_str() {
                        "$schema" => index.schema = Some(value),
                        "name" => index.name = Some(value),
                        "type" => index.kind = Some(value),
                        _ => index.semantic_highlighting = Some(value),
                    }
                }
                "colors" => {
                    let map = as_object(value, path, "colors")?;
                    tracing::info!("colors: has {} values", map.len());
                    index.index_colors(&map);
                    index.colors = Some(map);
                }
                "tokenColors" => {
                    let rules = stage_token_rules(value, path)?;
                    tracing::info!("tokenColors: has {} values", rules.len());
                    index.index_token_rules(&rules);
                    index.token_rules = Some(rules);
                }
                "semanticTokenColors" => {
                    let map = as_object(value, path, "semanticTokenColors")?;
                    tracing::info!("semanticTokenColors: has {} values", map.len());
                    index.index_semantic(&map);
                    index.semantic = Some(map);
                }
                _ => {
                    tracing::warn!(key = %key, "unrecognized top-level key");
                    index.extra.insert(key, value);
                }
            }
        }
        Ok(index)
    }

    fn index_colors(&mut self, map: &Map<String, Json>) {
        for (scope, value) in map {
            match value.as_str() {
                Some(color) => self.register(Section::Colors, scope, color),
                None => tracing::warn!(scope = %scope, "colors entry is not a string; skipped"),
            }
        }
    }

    fn index_token_rules(&mut self, rules: &[StagedTokenRule]) {
        for rule in rules {
            let color = match color_entry(&rule.settings) {
                Some(c) => c,
                None => {
                    tracing::debug!(scopes = ?rule.scopes, "tokenColors rule has no foreground or fontStyle");
                    continue;
                }
            };
            for scope in &rule.scopes {
                self.register(Section::TokenColors, scope, &color);
            }
        }
    }

    fn index_semantic(&mut self, map: &Map<String, Json>) {
        for (scope, value) in map {
            let color = match value {
                Json::String(s) => Some(s.clone()),
                Json::Object(settings) => color_entry(settings),
                _ => None,
            };
            match color {
                Some(c) => self.register(Section::SemanticTokenColors, scope, &c),
                None => tracing::debug!(scope = %scope, "semanticTokenColors entry has no color"),
            }
        }
    }

    /// Record one binding in the binding list and the reverse index.
    pub fn register(&mut self, section: Section, scope: &str, color: &str) {
        let key = (section, scope.to_string());
        if let Some(prev) = self.last_seen.get(&key) {
            if prev != color {
                tracing::warn!(section = %section, scope = %scope, previous = %prev, current = %color, "scope rebound within section");
                self.self_conflicts.push(SelfConflict {
                    section,
                    scope: scope.to_string(),
                    previous: prev.clone(),
                    current: color.to_string(),
                });
            }
        }
        self.last_seen.insert(key, color.to_string());
        self.reverse
            .entry(color.to_string())
            .or_default()
            .entry(section)
            .or_default()
            .insert(scope.to_string());
        self.bindings.push(ScopeBinding {
            section,
            scope: scope.to_string(),
            color: color.to_string(),
        });
    }

    /// Effective color for a scope in a section (last binding wins).
    pub fn color_of(&self, section: Section, scope: &str) -> Option<&str> {
        self.last_seen
            .get(&(section, scope.to_string()))
            .map(String::as_str)
    }
}

fn shape(path: &Path, message: &str) -> ThemeError {
    ThemeError::Shape {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn as_object(value: Json, path: &Path, what: &str) -> Result<Map<String, Json>> {
    match value {
        Json::Object(m) => Ok(m),
        _ => Err(shape(path, &format!("`{}` must be an object", what))),
    }
}

fn stage_token_rules(value: Json, path: &Path) -> Result<Vec<StagedTokenRule>> {
    let list = match value {
        Json::Array(a) => a,
        _ => return Err(shape(path, "`tokenColors` must be an array")),
    };
    let mut rules = Vec::with_capacity(list.len());
    for (i, item) in list.into_iter().enumerate() {
        let mut obj = match item {
            Json::Object(o) => o,
            _ => {
                return Err(shape(
                    path,
                    &format!("`tokenColors[{}]` must be an object", i),
                ))
            }
        };
        let name = obj.remove("name");
        let scopes = match obj.remove("scope") {
            None => Vec::new(),
            Some(Json::String(s)) => vec![s],
            Some(Json::Array(items)) => items
                .into_iter()
                .filter_map(|s| match s {
                    Json::String(s) => Some(s),
                    other => {
                        tracing::warn!(index = i, value = %other, "non-string scope skipped");
                        None
                    }
                })
                .collect(),
            Some(other) => {
                return Err(shape(
                    path,
                    &format!("`tokenColors[{}].scope` must be a string or list, got {}", i, other),
                ))
            }
        };
        let settings = match obj.remove("settings") {
            None => Map::new(),
            Some(Json::Object(s)) => s,
            Some(_) => {
                return Err(shape(
                    path,
                    &format!("`tokenColors[{}].settings` must be an object", i),
                ))
            }
        };
        rules.push(StagedTokenRule {
            name,
            scopes,
            settings,
            extra: obj,
        });
    }
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(text: &str) -> ThemeIndex {
        ThemeIndex::parse_str(text, Path::new("theme.json")).unwrap()
    }

    #[test]
    fn test_color_entry_combinations() {
        let both = json!({"foreground": "#888888", "fontStyle": "italic"});
        let fg = json!({"foreground": "#888888"});
        let style = json!({"fontStyle": "bold"});
        let neither = json!({"background": "#000000"});
        assert_eq!(color_entry(both.as_object().unwrap()).as_deref(), Some("#888888 italic"));
        assert_eq!(color_entry(fg.as_object().unwrap()).as_deref(), Some("#888888"));
        assert_eq!(color_entry(style.as_object().unwrap()).as_deref(), Some("bold"));
        assert_eq!(color_entry(neither.as_object().unwrap()), None);
    }

    #[test]
    fn test_parse_all_sections() {
        let idx = parse(
            r##"{
  // Spin2 light theme
  "$schema": "vscode://schemas/color-theme",
  "name": "Spin2 Ironsheep Light",
  "type": "light",
  "semanticHighlighting": true,
  "colors": { "editor.background": "#ffffff", "editor.foreground": "#000000" },
  "tokenColors": [
    { "name": "Comments", "scope": ["comment", "comment.block"], "settings": { "foreground": "#008000", "fontStyle": "italic" } },
    { "scope": "keyword", "settings": { "foreground": "#0000ff" } },
    { "settings": { "foreground": "#111111" } },
  ],
  "semanticTokenColors": {
    "variable.readonly": "#4a4aff",
    "method": { "foreground": "#795e26", "fontStyle": "bold" }
  }
}"##,
        );
        assert_eq!(idx.kind, Some(json!("light")));
        assert_eq!(idx.semantic_highlighting, Some(json!(true)));
        assert_eq!(idx.token_rules.as_ref().unwrap().len(), 3);
        assert_eq!(idx.token_rules.as_ref().unwrap()[0].scopes, vec!["comment", "comment.block"]);
        assert_eq!(idx.bindings.len(), 2 + 3 + 2);
        assert_eq!(idx.color_of(Section::TokenColors, "comment.block"), Some("#008000 italic"));
        assert_eq!(idx.color_of(Section::SemanticTokenColors, "method"), Some("#795e26 bold"));
        let users = &idx.reverse["#0000ff"];
        assert!(users[&Section::TokenColors].contains("keyword"));
        assert!(idx.self_conflicts.is_empty());
    }

    #[test]
    fn test_self_conflict_within_token_colors() {
        let idx = parse(
            r##"{"tokenColors": [
                {"scope": "string", "settings": {"foreground": "#a31515"}},
                {"scope": ["string", "number"], "settings": {"foreground": "#098658"}}
            ]}"##,
        );
        assert_eq!(idx.self_conflicts.len(), 1);
        let c = &idx.self_conflicts[0];
        assert_eq!(c.scope, "string");
        assert_eq!(c.previous, "#a31515");
        assert_eq!(c.current, "#098658");
        assert_eq!(idx.color_of(Section::TokenColors, "string"), Some("#098658"));
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let idx = parse(r#"{"name": "x", "include": "./base.json"}"#);
        assert_eq!(idx.extra.get("include"), Some(&json!("./base.json")));
        assert!(idx.colors.is_none());
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = ThemeIndex::parse_str("{\"colors\": {", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, ThemeError::Parse { .. }));
    }

    #[test]
    fn test_wrong_section_shape_is_reported() {
        let err = ThemeIndex::parse_str(r#"{"tokenColors": {}}"#, Path::new("t.json")).unwrap_err();
        assert!(matches!(err, ThemeError::Shape { .. }));
    }
}
