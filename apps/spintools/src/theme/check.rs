//! Consistency check over an indexed theme.
//!
//! A scope is inconsistent when the theme binds it to more than one distinct
//! color entry, whether across sections (`colors` vs `tokenColors`) or
//! within one. Each inconsistent scope yields exactly one `ScopeConflict`;
//! rebindings inside a single section are carried in that same group.

use super::{Section, SelfConflict, ThemeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One color used by a conflicting scope, with the sections that used it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictColor {
    pub color: String,
    pub sections: Vec<Section>,
}

/// A scope bound to two or more distinct color entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeConflict {
    pub scope: String,
    pub colors: Vec<ConflictColor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rebound: Vec<SelfConflict>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub scopes: usize,
    pub colors: usize,
    pub bindings: usize,
    pub conflicts: usize,
    pub self_conflicts: usize,
}

/// Result of `check_consistency`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub file: String,
    pub conflicts: Vec<ScopeConflict>,
    pub summary: CheckSummary,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Find every scope bound to more than one color entry. Scopes are sorted
/// alphabetically and so are the colors within each conflict.
pub fn check_consistency(index: &ThemeIndex) -> CheckReport {
    let mut by_scope: BTreeMap<&str, BTreeMap<&str, BTreeSet<Section>>> = BTreeMap::new();
    for (color, sections) in &index.reverse {
        for (section, scopes) in sections {
            for scope in scopes {
                by_scope
                    .entry(scope.as_str())
                    .or_default()
                    .entry(color.as_str())
                    .or_default()
                    .insert(*section);
            }
        }
    }

    let scope_total = by_scope.len();
    let conflicts: Vec<ScopeConflict> = by_scope
        .into_iter()
        .filter(|(_, colors)| colors.len() > 1)
        .map(|(scope, colors)| ScopeConflict {
            scope: scope.to_string(),
            colors: colors
                .into_iter()
                .map(|(color, sections)| ConflictColor {
                    color: color.to_string(),
                    sections: sections.into_iter().collect(),
                })
                .collect(),
            rebound: index
                .self_conflicts
                .iter()
                .filter(|sc| sc.scope == scope)
                .cloned()
                .collect(),
        })
        .collect();
    for c in &conflicts {
        tracing::warn!(scope = %c.scope, colors = c.colors.len(), "scope bound to multiple colors");
    }

    CheckReport {
        file: index.source.to_string_lossy().to_string(),
        summary: CheckSummary {
            scopes: scope_total,
            colors: index.reverse.len(),
            bindings: index.bindings.len(),
            conflicts: conflicts.len(),
            self_conflicts: index.self_conflicts.len(),
        },
        conflicts,
    }
}

/// Raw scope list with the number of bindings naming each scope.
pub fn scope_counts(index: &ThemeIndex) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for b in &index.bindings {
        *counts.entry(b.scope.clone()).or_insert(0) += 1;
    }
    counts
}

/// Entries grouped by section, then color, each scope list sorted.
pub fn entries_by_section(index: &ThemeIndex) -> BTreeMap<Section, BTreeMap<String, Vec<String>>> {
    let mut out: BTreeMap<Section, BTreeMap<String, Vec<String>>> = BTreeMap::new();
    for (color, sections) in &index.reverse {
        for (section, scopes) in sections {
            out.entry(*section)
                .or_default()
                .insert(color.clone(), scopes.iter().cloned().collect());
        }
    }
    out
}
