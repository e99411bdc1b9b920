//! Text report for a finished certifier scan.
//!
//! Every line is written and flushed as it is produced so an interrupted
//! run still leaves a readable partial report. Directory sections start
//! with a single tab so the report can be fed back as a marks file.

use super::marks::MarkTable;
use super::{Certifier, Result};
use crate::error::CertifyError;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Line-oriented writer that flushes after every finding.
pub struct ReportWriter<W: Write> {
    out: W,
    target: PathBuf,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W, target: impl Into<PathBuf>) -> Self {
        ReportWriter {
            out,
            target: target.into(),
        }
    }

    pub fn finding(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{}", line)
            .and_then(|_| self.out.flush())
            .map_err(|e| CertifyError::io(&self.target, e))
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Write the complete report: header, per-directory listings, then the
/// summary sections.
pub fn write_report<W: Write>(
    certifier: &Certifier,
    root: &Path,
    marks: Option<&MarkTable>,
    w: &mut ReportWriter<W>,
) -> Result<()> {
    let dirname = root
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    let basename = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.to_string_lossy().to_string());
    w.finding("Spin/Spin2 files in FOLDER:")?;
    w.finding(&format!(" Root {}:", dirname))?;
    w.finding(&format!(" {}:", basename))?;

    write_directories(certifier, marks, w)?;
    write_stats(certifier, &root.to_string_lossy(), w)?;
    write_name_counts(certifier, w)?;
    write_repeated_names(certifier, w)?;
    write_shared_content(certifier, w)?;
    Ok(())
}

fn write_directories<W: Write>(
    certifier: &Certifier,
    marks: Option<&MarkTable>,
    w: &mut ReportWriter<W>,
) -> Result<()> {
    let mut matched = 0usize;
    for dir in certifier.directories() {
        w.finding("")?;
        w.finding(&format!(
            "\t{:03}-{}:  {}:",
            dir.number, dir.depth, dir.display_path
        ))?;
        let mut names: Vec<&str> = dir.files.iter().map(|f| f.name.as_str()).collect();
        names.sort_by(|a, b| super::casefold_cmp(a, b));
        for name in names {
            let (seq, count) = match certifier.name_stat(name) {
                Some(s) => (s.seq, s.count),
                None => {
                    tracing::warn!(file = %name, "no occurrence entry for listed file");
                    (0, 0)
                }
            };
            let mark = marks.and_then(|m| m.lookup(&dir.display_path, name));
            let done = match mark.and_then(|m| m.done.as_deref()) {
                Some(d) => format!(" {}", d),
                None => String::new(),
            };
            w.finding(&format!("\t\t- {} [{},{}]{}", name, seq, count, done))?;
            if let Some(m) = mark {
                matched += 1;
                for note in &m.notes {
                    w.finding(&format!("\t\t\t- {}", note))?;
                }
            }
        }
    }
    if let Some(m) = marks {
        tracing::info!(
            matched,
            directories = m.directory_count(),
            "merged marks from prior report"
        );
    }
    Ok(())
}

fn write_stats<W: Write>(certifier: &Certifier, root: &str, w: &mut ReportWriter<W>) -> Result<()> {
    w.finding("")?;
    w.finding(&format!("Stats for FOLDER: {}", root))?;
    w.finding(&format!(
        "\t{} directories containing:",
        certifier.directories().len()
    ))?;
    w.finding(&format!("\t\t{} Unique filenames", certifier.distinct_names()))?;
    w.finding(&format!(
        "\t\t({} Unique files where content is diff.)",
        certifier.distinct_hashes()
    ))
}

fn write_name_counts<W: Write>(certifier: &Certifier, w: &mut ReportWriter<W>) -> Result<()> {
    w.finding("")?;
    w.finding("Alphabetical list of files with nbr of times found:")?;
    for (name, stat) in certifier.names_sorted() {
        w.finding(&format!("\t{}x {}", stat.count, name))?;
    }
    Ok(())
}

fn write_repeated_names<W: Write>(certifier: &Certifier, w: &mut ReportWriter<W>) -> Result<()> {
    w.finding("")?;
    w.finding("Alphabetical list of files appearing more than once:")?;
    let mut by_count: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (name, stat) in certifier.names_sorted() {
        if stat.count > 1 {
            by_count.entry(stat.count).or_default().push(name);
        }
    }
    if by_count.is_empty() {
        return w.finding("\tNo files appear more than once");
    }
    for (count, names) in by_count {
        w.finding(&format!("\tFiles appearing {} times:", count))?;
        for name in names {
            w.finding(&format!(
                "\t\t{}  ({} unique versions)",
                name,
                certifier.unique_versions(name)
            ))?;
        }
    }
    Ok(())
}

fn write_shared_content<W: Write>(certifier: &Certifier, w: &mut ReportWriter<W>) -> Result<()> {
    w.finding("")?;
    w.finding("Identical files with more than one name:")?;
    let shared = certifier.shared_hashes();
    if shared.is_empty() {
        return w.finding("\tNo identical files with different names");
    }
    for (hash, names) in shared {
        w.finding(&format!("\t{} Files with md5:[{}]:", names.len(), hash))?;
        for name in names {
            w.finding(&format!(
                "\t\t{}  ({} unique versions)",
                name,
                certifier.unique_versions(name)
            ))?;
        }
    }
    Ok(())
}
