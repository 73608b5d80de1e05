//! Candidate summary generation through a hosted generative model.
//!
//! The client is configured explicitly through [`GenerationConfig`]; nothing
//! here is process-global, so the scoring engine never depends on it.

use crate::corpus::{next_start_number, numbered_files};
use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::utils::is_blank;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const PLACEHOLDER: &str = "{document}";

const FEW_SHOT_TEMPLATE: &str = r#"**Task:** Generate a concise academic summary following the established patterns of high-quality scholarly abstracts.

**Example:**
Source: [15000-word analysis of FDA regulation and innovation]
Summary: "How does FDA regulation affect innovation and market concentration? I examine this question by exploiting FDA deregulation events that affected certain medical device types but not others. My analysis yields three core results. First, deregulation increases the quantity and quality of new technologies. Second, it increases firm entry and lowers prices. Third, serious injuries attributable to defective devices do not increase measurably."

**Instructions:**
1. Open with a research question or a statement such as "This study examines ...".
2. Use common academic phrases naturally: "the study", "the findings", "the results", "data from", "analysis of".
3. State the method, the two or three most important findings, the scope, and the main conclusion.
4. Keep the exact technical terms and proper nouns of the source.
5. Write a single paragraph of 150-250 words in an academic tone, with no information beyond the source.

**Document to analyze:**
{document}
"#;

const BASIC_TEMPLATE: &str = r#"**Task:** Generate a concise summary of the following document.

**Instructions:**
1. The summary must be a single, coherent paragraph.
2. The word count must be between 150 and 250 words.
3. Use only information explicitly stated in the source document.
4. Paraphrase the content. Do not copy sentences verbatim.
5. Prefer the key terminology and phrasing of the original document.

**Document to analyze:**
{document}
"#;

/// A prompt with a `{document}` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(PLACEHOLDER) {
            return Err(Error::InvalidTemplate);
        }
        Ok(PromptTemplate { template })
    }

    /// Few-shot academic abstract prompt.
    pub fn few_shot() -> Self {
        PromptTemplate {
            template: FEW_SHOT_TEMPLATE.to_string(),
        }
    }

    pub fn basic() -> Self {
        PromptTemplate {
            template: BASIC_TEMPLATE.to_string(),
        }
    }

    pub fn render(&self, document: &str) -> String {
        self.template.replace(PLACEHOLDER, document)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        PromptTemplate::few_shot()
    }
}

/// Model and run settings for summary generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    /// Usually supplied through `GEMINI_API_KEY` rather than the config file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Pause between consecutive requests.
    pub request_delay_ms: u64,
    /// Maximum files handled per run.
    pub limit: usize,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            model: "gemini-2.5-flash-lite".to_string(),
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.1,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 512,
            request_delay_ms: 5000,
            limit: 100,
            timeout_secs: 60,
        }
    }
}

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Returns the generated text for a fully rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    config: GenerationConfig,
    api_key: String,
    http_client: Client,
}

impl GeminiClient {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingApiKey)?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(GeminiClient {
            config,
            api_key,
            http_client,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        let safety_settings: Vec<Value> = [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .iter()
        .map(|category| json!({"category": category, "threshold": "BLOCK_MEDIUM_AND_ABOVE"}))
        .collect();

        json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": self.config.temperature,
                "topP": self.config.top_p,
                "topK": self.config.top_k,
                "maxOutputTokens": self.config.max_output_tokens,
                "responseMimeType": "text/plain",
            },
            "safetySettings": safety_settings,
        })
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    Some(text)
}

#[async_trait]
impl SummaryGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.model), level = "debug")]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let response_json: Value = response.json().await?;
        match extract_text(&response_json) {
            Some(text) if !is_blank(&text) => Ok(text.trim().to_string()),
            _ => Err(Error::EmptyResponse),
        }
    }
}

/// Summarizes one document file into `output`. Returns the summary's word count.
pub async fn summarize_file<G: SummaryGenerator + ?Sized>(
    generator: &G,
    template: &PromptTemplate,
    input: &Path,
    output: &Path,
) -> Result<usize> {
    let document = fs::read_to_string(input)?;
    if is_blank(&document) {
        return Err(Error::EmptyDocument(input.to_path_buf()));
    }

    let summary = generator.generate(&template.render(&document)).await?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &summary)?;
    Ok(summary.split_whitespace().count())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub start: Option<u64>,
    pub processed: usize,
    pub failed: usize,
}

/// Generates summaries for the numbered documents in `input_dir`, writing
/// `<id>.txt` into `output_dir`.
///
/// Without an explicit `start`, resumes at the first input that has no
/// output yet. At most `config.limit` files are attempted; a failing file is
/// logged and the run moves on.
pub async fn summarize_directory<G: SummaryGenerator + ?Sized>(
    generator: &G,
    template: &PromptTemplate,
    input_dir: &Path,
    output_dir: &Path,
    start: Option<u64>,
    config: &GenerationConfig,
) -> Result<RunSummary> {
    let inputs = numbered_files(input_dir)?;

    // Outputs already on disk are left alone when resuming, gaps included.
    let mut completed: BTreeSet<u64> = BTreeSet::new();
    let start = match start {
        Some(start) => {
            info!(start, "starting from requested article");
            Some(start)
        }
        None => {
            if output_dir.is_dir() {
                completed = numbered_files(output_dir)?.into_iter().map(|(id, _)| id).collect();
            }
            let ids: Vec<u64> = inputs.iter().map(|(id, _)| *id).collect();
            let resumed = next_start_number(&ids, &completed);
            if let Some(id) = resumed {
                info!(start = id, completed = completed.len(), "resuming");
            }
            resumed
        }
    };

    let mut run = RunSummary {
        start,
        ..RunSummary::default()
    };
    let Some(start) = start else {
        info!(dir = %input_dir.display(), "nothing left to summarize");
        return Ok(run);
    };

    let batch: Vec<_> = inputs
        .into_iter()
        .filter(|(id, _)| *id >= start && !completed.contains(id))
        .take(config.limit)
        .collect();
    let total = batch.len();
    let progress = Progress::new(Some(total as u64), "Summarizing");

    for (i, (id, input)) in batch.into_iter().enumerate() {
        if i > 0 && config.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.request_delay_ms)).await;
        }
        let output = output_dir.join(format!("{}.txt", id));
        progress.set_message(format!("article #{}", id));
        debug!(paper_id = id, "({}/{}) summarizing", i + 1, total);
        match summarize_file(generator, template, &input, &output).await {
            Ok(words) => {
                debug!(paper_id = id, words, "saved summary");
                run.processed += 1;
            }
            Err(e) => {
                warn!(paper_id = id, error = %e, "failed to summarize");
                run.failed += 1;
            }
        }
        progress.inc();
    }
    progress.finish_and_clear();
    info!(processed = run.processed, failed = run.failed, "summarization run finished");
    Ok(run)
}
