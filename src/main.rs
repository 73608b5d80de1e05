//! summeval command-line interface
//!
//! ```bash
//! summeval prepare --split train --with-summaries
//! summeval generate --split test_features
//! summeval evaluate --split train
//! summeval classify --split train
//! summeval export --split test_features
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use summeval::config::Config;
use summeval::generate::{summarize_directory, GeminiClient, PromptTemplate};
use summeval::{classify, corpus, metric, report, Evaluator};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "summeval", version, about = "Generate and ROUGE-score text summaries")]
struct Cli {
    /// Configuration file (missing file means defaults)
    #[arg(long, global = true, default_value = "summeval.toml", env = "SUMMEVAL_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split `<data_dir>/<split>.csv` into one text file per document
    Prepare {
        #[arg(long, default_value = "train")]
        split: String,
        /// Also write the `summary` column as reference files
        #[arg(long)]
        with_summaries: bool,
    },
    /// Generate candidate summaries, resuming after the last finished document
    Generate {
        #[arg(long, default_value = "test_features")]
        split: String,
        /// Start at this document number instead of resuming
        #[arg(long)]
        start_from: Option<u64>,
        /// Use the plain instruction prompt instead of the few-shot one
        #[arg(long)]
        basic_prompt: bool,
        /// Custom prompt template file containing `{document}`
        #[arg(long, conflicts_with = "basic_prompt")]
        prompt_file: Option<PathBuf>,
    },
    /// Score generated summaries against the references
    Evaluate {
        #[arg(long, default_value = "train")]
        split: String,
        #[arg(long)]
        predictions_dir: Option<PathBuf>,
        #[arg(long)]
        ground_truth_dir: Option<PathBuf>,
        /// Metric identifiers, e.g. rouge-1,rouge-2,rouge-l
        #[arg(long, value_delimiter = ',')]
        metrics: Vec<String>,
        #[arg(long)]
        workers: Option<usize>,
        /// Print the results as JSON instead of the text report
        #[arg(long)]
        json: bool,
    },
    /// Sort reference summaries into structured and unstructured lists
    Classify {
        #[arg(long, default_value = "train")]
        split: String,
    },
    /// Collect generated summaries into `<outputs_dir>/summaries.csv`
    Export {
        #[arg(long, default_value = "test_features")]
        split: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    match cli.command {
        Command::Prepare {
            split,
            with_summaries,
        } => {
            let csv_path = config.paths.csv_path(&split);
            let summary_dir = with_summaries.then(|| config.paths.summary_dir(&split));
            let written = corpus::materialize_csv(
                &csv_path,
                &config.paths.text_dir(&split),
                summary_dir.as_deref(),
            )
            .with_context(|| format!("Failed to materialize {}", csv_path.display()))?;
            println!("Wrote {} documents for split '{}'", written, split);
        }
        Command::Generate {
            split,
            start_from,
            basic_prompt,
            prompt_file,
        } => {
            let template = match prompt_file {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    PromptTemplate::new(raw)?
                }
                None if basic_prompt => PromptTemplate::basic(),
                None => PromptTemplate::few_shot(),
            };
            let input_dir = config.paths.text_dir(&split);
            if !input_dir.is_dir() {
                bail!("Input directory not found: {}", input_dir.display());
            }
            let client = GeminiClient::new(config.generation.clone())?;
            let run = summarize_directory(
                &client,
                &template,
                &input_dir,
                &config.paths.generated_dir(&split),
                start_from,
                &config.generation,
            )
            .await?;
            println!(
                "Generated {} summaries ({} failed)",
                run.processed, run.failed
            );
        }
        Command::Evaluate {
            split,
            predictions_dir,
            ground_truth_dir,
            metrics,
            workers,
            json,
        } => {
            let pred_dir = predictions_dir.unwrap_or_else(|| config.paths.generated_dir(&split));
            let truth_dir = ground_truth_dir.unwrap_or_else(|| config.paths.summary_dir(&split));
            for dir in [&pred_dir, &truth_dir] {
                if !dir.is_dir() {
                    bail!("Directory not found: {}", dir.display());
                }
            }

            let references = corpus::load_documents(&truth_dir)?;
            let candidates = corpus::load_documents(&pred_dir)?;
            info!(
                references = references.len(),
                candidates = candidates.len(),
                "loaded summaries"
            );
            let aligned = corpus::align(&references, &candidates);
            if aligned.ids.is_empty() {
                bail!("No predictions have a matching ground truth summary");
            }
            info!(pairs = aligned.ids.len(), "aligned summaries");

            let metrics = if metrics.is_empty() {
                config.evaluation.metrics.clone()
            } else {
                metric::parse_metrics(&metrics)?
            };
            let evaluator = Evaluator::new(metrics);
            let workers = workers.unwrap_or(config.evaluation.workers);
            let results = if workers > 1 {
                evaluator
                    .evaluate_concurrent(aligned.references, aligned.candidates, workers)
                    .await?
            } else {
                evaluator.evaluate(&aligned.references, &aligned.candidates)?
            };

            if json {
                println!("{}", report::to_json(&results)?);
            } else {
                println!("{}", report::format_report(&results));
            }
        }
        Command::Classify { split } => {
            let dir = config.paths.summary_dir(&split);
            let classification = classify::classify_directory(&dir)
                .with_context(|| format!("Failed to classify {}", dir.display()))?;
            classification.write_lists(&config.paths.outputs_dir)?;
            println!(
                "{} structured, {} unstructured (lists in {})",
                classification.structured.len(),
                classification.unstructured.len(),
                config.paths.outputs_dir.display()
            );
        }
        Command::Export { split, output } => {
            let out = output.unwrap_or_else(|| config.paths.outputs_dir.join("summaries.csv"));
            let rows = corpus::export_csv(&config.paths.generated_dir(&split), &out)?;
            println!("Wrote {} summaries to {}", rows, out.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_metrics_list() {
        let cli = Cli::parse_from([
            "summeval",
            "evaluate",
            "--metrics",
            "rouge-1,rouge-l",
            "--workers",
            "4",
        ]);
        match cli.command {
            Command::Evaluate {
                metrics, workers, ..
            } => {
                assert_eq!(metrics, vec!["rouge-1", "rouge-l"]);
                assert_eq!(workers, Some(4));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_conflicting_prompts() {
        let result = Cli::try_parse_from([
            "summeval",
            "generate",
            "--basic-prompt",
            "--prompt-file",
            "p.txt",
        ]);
        assert!(result.is_err());
    }
}
