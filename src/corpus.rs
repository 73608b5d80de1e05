//! Documents on disk: one `<id>.txt` per document, keyed by a numeric id.

use crate::error::Result;
use crate::progress::Progress;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct DocumentRow {
    paper_id: u64,
    text: String,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    paper_id: u64,
    summary: &'a str,
}

fn document_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{}.txt", id))
}

fn numeric_stem(path: &Path) -> Option<u64> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

/// Splits a CSV with `paper_id`, `text` and optional `summary` columns into
/// per-document files. Summaries are written only when `summary_dir` is set.
/// Rows that fail to write are logged and skipped; returns the rows written.
pub fn materialize_csv(
    csv_path: &Path,
    text_dir: &Path,
    summary_dir: Option<&Path>,
) -> Result<usize> {
    fs::create_dir_all(text_dir)?;
    if let Some(dir) = summary_dir {
        fs::create_dir_all(dir)?;
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let progress = Progress::new(None, "Saving files");
    let mut written = 0;
    for row in reader.deserialize() {
        let row: DocumentRow = row?;
        progress.inc();
        if let Err(e) = fs::write(document_path(text_dir, row.paper_id), &row.text) {
            warn!(paper_id = row.paper_id, error = %e, "could not write text file");
            continue;
        }
        if let (Some(dir), Some(summary)) = (summary_dir, &row.summary) {
            if let Err(e) = fs::write(document_path(dir, row.paper_id), summary) {
                warn!(paper_id = row.paper_id, error = %e, "could not write summary file");
                continue;
            }
        }
        written += 1;
    }
    progress.finish_and_clear();
    info!(rows = written, dir = %text_dir.display(), "materialized documents");
    Ok(written)
}

/// `*.txt` files in `dir` whose stem is a number, sorted by that number.
pub fn numbered_files(dir: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        match numeric_stem(&path) {
            Some(id) => files.push((id, path)),
            None => warn!(path = %path.display(), "skipping file without a numeric name"),
        }
    }
    files.sort_by_key(|(id, _)| *id);
    Ok(files)
}

/// Reads every numbered document in `dir`. Unreadable files are skipped.
pub fn load_documents(dir: &Path) -> Result<BTreeMap<u64, String>> {
    let files = numbered_files(dir)?;
    let progress = Progress::new(Some(files.len() as u64), "Reading");
    let mut documents = BTreeMap::new();
    for (id, path) in files {
        progress.inc();
        match fs::read_to_string(&path) {
            Ok(text) => {
                documents.insert(id, text);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not read document"),
        }
    }
    progress.finish_and_clear();
    Ok(documents)
}

/// Reference/candidate texts paired by id, in ascending id order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AlignedPairs {
    pub ids: Vec<u64>,
    pub references: Vec<String>,
    pub candidates: Vec<String>,
}

/// Pairs each candidate with the reference of the same id. Candidates with
/// no reference are logged and left out.
pub fn align(
    references: &BTreeMap<u64, String>,
    candidates: &BTreeMap<u64, String>,
) -> AlignedPairs {
    let mut aligned = AlignedPairs::default();
    for (id, candidate) in candidates {
        match references.get(id) {
            Some(reference) => {
                aligned.ids.push(*id);
                aligned.references.push(reference.clone());
                aligned.candidates.push(candidate.clone());
            }
            None => warn!(paper_id = id, "no reference summary, skipping"),
        }
    }
    aligned
}

/// First input id (in ascending order) without a completed output, i.e. the
/// highest contiguous completed index plus one. `None` when all are done.
pub fn next_start_number(inputs: &[u64], completed: &BTreeSet<u64>) -> Option<u64> {
    let mut sorted = inputs.to_vec();
    sorted.sort_unstable();
    sorted.into_iter().find(|id| !completed.contains(id))
}

/// Writes `paper_id,summary` rows for every numbered file in `dir`, sorted by id.
pub fn export_csv(dir: &Path, out: &Path) -> Result<usize> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    let documents = load_documents(dir)?;
    let mut writer = csv::Writer::from_path(out)?;
    for (id, summary) in &documents {
        writer.serialize(SummaryRow {
            paper_id: *id,
            summary: summary.trim(),
        })?;
    }
    writer.flush()?;
    info!(rows = documents.len(), path = %out.display(), "exported summaries");
    Ok(documents.len())
}
