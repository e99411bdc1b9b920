//! Reader for completion marks carried over from an earlier report.
//!
//! A prior report (usually hand-edited in a TaskPaper-style editor) is read
//! line by line and every line is classified as one of:
//! - directory line: one leading tab/space, text ending in `:`
//! - file line: `\t\t- <filename> [seq,count] @done(...)`
//! - note line: `\t\t\t- <free text>`
//!
//! Anything else is ignored. The result is a `MarkTable` keyed by the
//! normalized directory path, then by filename.

use crate::error::CertifyError;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Annotation attached to one file in one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mark {
    pub done: Option<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct DirMarks {
    line: usize,
    files: BTreeMap<String, Mark>,
}

/// Marks indexed by normalized directory key then filename.
#[derive(Debug, Clone, Default)]
pub struct MarkTable {
    dirs: BTreeMap<String, DirMarks>,
}

/// Classification of a single marks-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkLine {
    Directory(String),
    File { name: String, done: Option<String> },
    Note(String),
    Other,
}

fn dir_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\t ](\S.*):\s*$").expect("static regex"))
}

fn numbered_dir_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{3}-\d+:\s+(.*)$").expect("static regex"))
}

fn file_body_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<name>.*?)(?:\s+\[\d+,\d+\])?(?:\s+(?P<done>@done(?:\([^)]*\))?))?\s*$")
            .expect("static regex")
    })
}

/// Canonical form of a directory key: `\` to `/`, repeated `/` collapsed,
/// no trailing `/` (except for the bare root).
pub fn normalize_key(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let mut out = String::with_capacity(unified.len());
    let mut prev_slash = false;
    for ch in unified.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Classify one line of a marks file.
pub fn classify_line(line: &str) -> MarkLine {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(rest) = line.strip_prefix("\t\t\t- ") {
        return MarkLine::Note(rest.trim_end().to_string());
    }
    if let Some(rest) = line.strip_prefix("\t\t- ") {
        if let Some(caps) = file_body_re().captures(rest) {
            let name = caps["name"].trim().to_string();
            if !name.is_empty() {
                return MarkLine::File {
                    name,
                    done: caps.name("done").map(|m| m.as_str().to_string()),
                };
            }
        }
        return MarkLine::Other;
    }
    if let Some(caps) = dir_line_re().captures(line) {
        let text = caps[1].trim();
        let key = match numbered_dir_re().captures(text) {
            Some(n) => n[1].to_string(),
            None => text.to_string(),
        };
        return MarkLine::Directory(normalize_key(&key));
    }
    MarkLine::Other
}

enum ReaderState {
    Idle,
    InDirectory { key: String, line: usize },
    InFile { key: String, line: usize, file: String },
}

impl MarkTable {
    /// Parse the text of a prior report.
    ///
    /// A directory is only registered once it holds a file line, so report
    /// headers and summary lines never collide with real directories. The
    /// same directory key holding files in two separate sections is an
    /// `AmbiguousMarks` error.
    pub fn parse(text: &str) -> Result<MarkTable, CertifyError> {
        let mut table = MarkTable::default();
        let mut state = ReaderState::Idle;
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            state = match (classify_line(raw), state) {
                (MarkLine::Directory(key), _) => ReaderState::InDirectory { key, line: line_no },
                (MarkLine::File { name, done }, ReaderState::InDirectory { key, line })
                | (MarkLine::File { name, done }, ReaderState::InFile { key, line, .. }) => {
                    table.add_file(&key, line, &name, done)?;
                    ReaderState::InFile {
                        key,
                        line,
                        file: name,
                    }
                }
                (MarkLine::File { name, .. }, ReaderState::Idle) => {
                    tracing::warn!(line = line_no, file = %name, "file mark outside any directory; skipped");
                    ReaderState::Idle
                }
                (MarkLine::Note(note), ReaderState::InFile { key, line, file }) => {
                    if let Some(m) = table
                        .dirs
                        .get_mut(&key)
                        .and_then(|d| d.files.get_mut(&file))
                    {
                        m.notes.push(note);
                    }
                    ReaderState::InFile { key, line, file }
                }
                (MarkLine::Note(note), other) => {
                    tracing::warn!(line = line_no, note = %note, "note outside any file; skipped");
                    other
                }
                (MarkLine::Other, s) => s,
            };
        }
        Ok(table)
    }

    fn add_file(
        &mut self,
        key: &str,
        opened_at: usize,
        name: &str,
        done: Option<String>,
    ) -> Result<(), CertifyError> {
        let dir = self.dirs.entry(key.to_string()).or_insert_with(|| DirMarks {
            line: opened_at,
            files: BTreeMap::new(),
        });
        if dir.line != opened_at {
            return Err(CertifyError::AmbiguousMarks {
                key: key.to_string(),
                first: dir.line,
                second: opened_at,
            });
        }
        let mark = dir.files.entry(name.to_string()).or_default();
        if done.is_some() {
            mark.done = done;
        }
        Ok(())
    }

    /// Marks for `file` in the directory whose key equals `dir_key` after
    /// normalization. There is no partial matching.
    pub fn lookup(&self, dir_key: &str, file: &str) -> Option<&Mark> {
        self.dirs
            .get(&normalize_key(dir_key))
            .and_then(|d| d.files.get(file))
    }

    pub fn directory_count(&self) -> usize {
        self.dirs.len()
    }
}
