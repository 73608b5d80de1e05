//! File-backed configuration with environment overrides.

use crate::error::{Error, Result};
use crate::generate::GenerationConfig;
use crate::metric::{Metric, DEFAULT_METRICS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub generation: GenerationConfig,
    pub evaluation: EvaluationConfig,
}

/// Where CSV inputs live and where per-document files are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub outputs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            data_dir: PathBuf::from("data"),
            outputs_dir: PathBuf::from("outputs"),
        }
    }
}

impl PathsConfig {
    /// `outputs/<split>/text`: source documents.
    pub fn text_dir(&self, split: &str) -> PathBuf {
        self.outputs_dir.join(split).join("text")
    }

    /// `outputs/<split>/summary`: reference summaries.
    pub fn summary_dir(&self, split: &str) -> PathBuf {
        self.outputs_dir.join(split).join("summary")
    }

    /// `outputs/<split>/summary_ai`: generated candidates.
    pub fn generated_dir(&self, split: &str) -> PathBuf {
        self.outputs_dir.join(split).join("summary_ai")
    }

    pub fn csv_path(&self, split: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", split))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub metrics: Vec<Metric>,
    /// Blocking workers used for batch scoring; 1 scores sequentially.
    pub workers: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            metrics: DEFAULT_METRICS.to_vec(),
            workers: 1,
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads `path` when it exists, falls back to defaults otherwise, then
    /// applies `GEMINI_API_KEY` from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.is_file() {
            debug!(path = %path.display(), "loading config");
            Config::from_toml_str(&fs::read_to_string(path)?)?
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Config::default()
        };
        config.apply_env(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// A non-empty key from the environment wins over the file.
    pub fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|key| !key.trim().is_empty()) {
            self.generation.api_key = Some(key);
        }
    }
}
