//! Error types for summeval.
//!
//! Pair-level degeneracies (an empty reference or candidate) are not errors;
//! they score as zero. Everything here is surfaced to the caller.

use std::path::PathBuf;

/// Error type for scoring and pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reference and candidate batches have different lengths.
    #[error("size mismatch: {references} references vs {candidates} candidates")]
    SizeMismatch { references: usize, candidates: usize },

    /// A batch with zero pairs was submitted for aggregation.
    #[error("cannot evaluate an empty batch")]
    EmptyBatch,

    /// Metric identifier that is not `rouge-<n>` (n >= 1) or `rouge-l`.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Prompt template lacks the `{document}` placeholder.
    #[error("prompt template must contain the {{document}} placeholder")]
    InvalidTemplate,

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    /// The generation API answered with a non-success status.
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("empty response from generation API")]
    EmptyResponse,

    #[error("document is empty or whitespace only: {}", .0.display())]
    EmptyDocument(PathBuf),

    #[error("worker task failed: {0}")]
    Join(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Result type alias for summeval operations.
pub type Result<T> = std::result::Result<T, Error>;
