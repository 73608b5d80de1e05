//! Labels reference summaries as structured (sectioned) or free-form.

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const STRUCTURED_KEYWORDS: &[&str] = &[
    "problem definition:",
    "methodology/results:",
    "managerial implications:",
    "methodology:",
    "results:",
    "conclusion:",
    "implications:",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Structured,
    Unstructured,
}

/// A summary is structured when some line, once trimmed, opens with a
/// section keyword. Markers in the middle of a line do not count.
pub fn classify(text: &str) -> SummaryKind {
    let lowered = text.to_lowercase();
    let structured = lowered.lines().any(|line| {
        let line = line.trim();
        STRUCTURED_KEYWORDS
            .iter()
            .any(|keyword| line.starts_with(keyword))
    });
    if structured {
        SummaryKind::Structured
    } else {
        SummaryKind::Unstructured
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Classification {
    pub structured: Vec<String>,
    pub unstructured: Vec<String>,
}

impl Classification {
    /// Writes `structured_files.txt` and `unstructured_files.txt`, one file
    /// name per line.
    pub fn write_lists(&self, out_dir: &Path) -> Result<()> {
        fs::create_dir_all(out_dir)?;
        fs::write(out_dir.join("structured_files.txt"), self.structured.join("\n"))?;
        fs::write(
            out_dir.join("unstructured_files.txt"),
            self.unstructured.join("\n"),
        )?;
        Ok(())
    }
}

/// Classifies every `*.txt` in `dir`. Unreadable files are skipped.
pub fn classify_directory(dir: &Path) -> Result<Classification> {
    let mut classification = Classification::default();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read summary");
                continue;
            }
        };
        match classify(&text) {
            SummaryKind::Structured => classification.structured.push(name),
            SummaryKind::Unstructured => classification.unstructured.push(name),
        }
    }
    classification.structured.sort();
    classification.unstructured.sort();
    info!(
        structured = classification.structured.len(),
        unstructured = classification.unstructured.len(),
        "classified summaries"
    );
    Ok(classification)
}
