//! ROUGE scoring of generated summaries against reference summaries, plus
//! the pipeline around it: CSV materialization, summary generation and
//! reference classification.
//!
//! The scoring engine (`utils`, `ngram`, `rouge`, `metric`, `score`,
//! `report`) is pure and does no I/O.

pub mod classify;
pub mod config;
pub mod corpus;
pub mod error;
pub mod generate;
pub mod metric;
pub mod ngram;
pub mod progress;
pub mod report;
pub mod rouge;
pub mod score;
pub mod utils;

#[cfg(feature = "python")]
mod python;

pub use error::{Error, Result};
pub use metric::Metric;
pub use report::format_report;
pub use rouge::{score_pair, PairScore};
pub use score::{evaluate_batch, AggregateResult, Evaluator};
