//! Directory certifier: walk a tree, fingerprint Spin/Spin2 sources, and
//! index them by name and by content.
//!
//! All indices are owned by a `Certifier` value so a scan can be repeated
//! (or run several times in one test process) without shared state.
//!
//! Traversal order is deterministic:
//! - entries at each level are sorted case-insensitively (exact name breaks ties);
//! - a directory's certifiable files are recorded before its sub-directories
//!   are visited;
//! - sub-directories whose name starts with `.` are never entered;
//! - symbolic links to directories are not followed, links to files are read.

pub mod hash;
pub mod marks;
pub mod report;

use crate::error::CertifyError;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub type Result<T> = std::result::Result<T, CertifyError>;

/// Sequence number and occurrence count for one filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameStat {
    pub seq: usize,
    pub count: usize,
}

/// A certifiable file found in a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub name: String,
    pub hash: Option<String>,
}

/// One registry entry: a directory holding at least one certifiable file.
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    pub number: usize,
    pub depth: usize,
    pub path: PathBuf,
    pub display_path: String,
    pub files: Vec<ListedFile>,
}

/// Scanner state: name occurrences, hash groups and the directory registry.
#[derive(Debug, Clone)]
pub struct Certifier {
    extensions: Vec<String>,
    root_alias: String,
    next_seq: usize,
    names: HashMap<String, NameStat>,
    versions: HashMap<String, BTreeSet<String>>,
    hashes: BTreeMap<String, Vec<String>>,
    directories: Vec<DirectoryListing>,
}

/// Case-insensitive ordering with an exact-name tie break.
pub fn casefold_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl Certifier {
    pub fn new(extensions: &[String], root_alias: &str) -> Self {
        Certifier {
            extensions: extensions
                .iter()
                .map(|e| format!(".{}", e.trim_start_matches('.')))
                .collect(),
            root_alias: root_alias.to_string(),
            next_seq: 1,
            names: HashMap::new(),
            versions: HashMap::new(),
            hashes: BTreeMap::new(),
            directories: Vec::new(),
        }
    }

    /// True when `name` ends with one of the configured extensions.
    pub fn is_certifiable(&self, name: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| name.len() > ext.len() && name.ends_with(ext.as_str()))
    }

    /// Walk `root` and populate all indices.
    pub fn scan(&mut self, root: &Path) -> Result<()> {
        if !root.is_dir() {
            return Err(CertifyError::RootNotFound(root.to_path_buf()));
        }
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut segments: Vec<String> = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by(walk_order)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden_dir(e));
        for entry in walker {
            let entry = entry.map_err(|e| walk_error(root, e))?;
            let depth = entry.depth();
            let file_type = entry.file_type();
            if file_type.is_dir() {
                segments.truncate(depth);
                segments.push(if depth == 0 {
                    root_name.clone()
                } else {
                    entry.file_name().to_string_lossy().to_string()
                });
                tracing::info!(folder = %entry.path().display(), "scanning folder");
                continue;
            }
            if file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(md) if md.is_file() => {}
                    Ok(md) if md.is_dir() => {
                        tracing::debug!(link = %entry.path().display(), "not following directory link");
                        continue;
                    }
                    _ => {
                        tracing::warn!(entry = %entry.path().display(), "skipping unknown entry type");
                        continue;
                    }
                }
            } else if !file_type.is_file() {
                tracing::warn!(entry = %entry.path().display(), "skipping unknown entry type");
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if !self.is_certifiable(&name) {
                continue;
            }
            segments.truncate(depth);
            let dir = entry.path().parent().unwrap_or(root);
            let display_path = self.display_path(&segments);
            let number = self.directory_number(dir, depth.saturating_sub(1), &display_path);
            let hash = match hash::content_hash(entry.path()) {
                Ok(h) => Some(h),
                Err(e) => {
                    tracing::warn!(file = %entry.path().display(), error = %e, "unable to hash file");
                    None
                }
            };
            self.record(&name, hash.as_deref());
            self.directories[number - 1].files.push(ListedFile { name, hash });
        }
        Ok(())
    }

    /// Register one sighting of a certifiable file.
    pub fn record(&mut self, name: &str, hash: Option<&str>) {
        match self.names.get_mut(name) {
            Some(stat) => stat.count += 1,
            None => {
                self.names.insert(
                    name.to_string(),
                    NameStat {
                        seq: self.next_seq,
                        count: 1,
                    },
                );
                self.next_seq += 1;
            }
        }
        if let Some(h) = hash {
            let group = self.hashes.entry(h.to_string()).or_default();
            if !group.iter().any(|n| n == name) {
                group.push(name.to_string());
            }
            self.versions
                .entry(name.to_string())
                .or_default()
                .insert(h.to_string());
        }
    }

    /// Number for `dir`, assigning the next one on first sight.
    fn directory_number(&mut self, dir: &Path, depth: usize, display_path: &str) -> usize {
        if let Some(pos) = self.directories.iter().position(|d| d.path == dir) {
            return pos + 1;
        }
        self.directories.push(DirectoryListing {
            number: self.directories.len() + 1,
            depth,
            path: dir.to_path_buf(),
            display_path: display_path.to_string(),
            files: Vec::new(),
        });
        self.directories.len()
    }

    /// Report path for a directory: segments joined by `/`. A scan root named
    /// like the root alias contributes an empty segment; deeper directories
    /// with that name are kept as written.
    fn display_path(&self, segments: &[String]) -> String {
        let joined = segments
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if i == 0 && *s == self.root_alias {
                    ""
                } else {
                    s.as_str()
                }
            })
            .collect::<Vec<_>>()
            .join("/");
        if joined.is_empty() {
            "/".to_string()
        } else {
            joined
        }
    }

    pub fn directories(&self) -> &[DirectoryListing] {
        &self.directories
    }

    pub fn name_stat(&self, name: &str) -> Option<NameStat> {
        self.names.get(name).copied()
    }

    /// All filenames with their stats, sorted case-insensitively.
    pub fn names_sorted(&self) -> Vec<(&str, NameStat)> {
        let mut v: Vec<(&str, NameStat)> =
            self.names.iter().map(|(k, s)| (k.as_str(), *s)).collect();
        v.sort_by(|a, b| casefold_cmp(a.0, b.0));
        v
    }

    /// Number of distinct content hashes seen for `name`.
    pub fn unique_versions(&self, name: &str) -> usize {
        self.versions.get(name).map(|s| s.len()).unwrap_or(0)
    }

    pub fn distinct_names(&self) -> usize {
        self.names.len()
    }

    pub fn distinct_hashes(&self) -> usize {
        self.hashes.len()
    }

    pub fn names_for_hash(&self, hash: &str) -> &[String] {
        self.hashes.get(hash).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Hashes produced by two or more distinct filenames, ordered by their
    /// first filename (case-insensitive) then by hash.
    pub fn shared_hashes(&self) -> Vec<(&str, &[String])> {
        let mut v: Vec<(&str, &[String])> = self
            .hashes
            .iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(h, names)| (h.as_str(), names.as_slice()))
            .collect();
        v.sort_by(|a, b| casefold_cmp(&a.1[0], &b.1[0]).then_with(|| a.0.cmp(b.0)));
        v
    }
}

/// Files before sub-directories, each group sorted case-insensitively.
fn walk_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| casefold_cmp(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy()))
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

fn walk_error(root: &Path, err: walkdir::Error) -> CertifyError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    CertifyError::io(path, io::Error::from(err))
}
