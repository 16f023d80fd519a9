//! One-shot command-line summarizer.
//!
//! Reads an article from `--text`, `--file`, or `--url`, prints the summary to stdout, and exits
//! with status 1 and the error message on stderr when anything fails.
use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use newsdigest::{
    config, logging,
    processing::{SummaryApi, SummaryInput, SummaryRequest, SummaryService, budget::parse_length},
};

#[derive(Parser)]
#[command(name = "digest", about = "Summarize a news article within a character budget")]
#[command(group(ArgGroup::new("source").required(true).args(["text", "file", "url"])))]
struct Cli {
    /// Article text to summarize.
    #[arg(long)]
    text: Option<String>,
    /// Read the article text from a file.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Fetch the article from a URL.
    #[arg(long)]
    url: Option<String>,
    /// Summarization model override.
    #[arg(long)]
    model: Option<String>,
    /// Maximum summary length in characters.
    #[arg(long, allow_hyphen_values = true)]
    max_chars: Option<String>,
    /// Minimum summary length in characters.
    #[arg(long, allow_hyphen_values = true)]
    min_chars: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing_for_stdio();

    match run(cli).await {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let text = match cli.file {
        Some(path) => Some(
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => cli.text,
    };
    let input = SummaryInput {
        text,
        url: cli.url,
        model: cli.model,
        max_length: cli
            .max_chars
            .as_deref()
            .map(|raw| parse_length("max_length", raw))
            .transpose()?,
        min_length: cli
            .min_chars
            .as_deref()
            .map(|raw| parse_length("min_length", raw))
            .transpose()?,
    };

    let service = SummaryService::from_config(config::get_config())?;
    let request = SummaryRequest::from_input(input, service.default_budget())?;
    let summary = service.summarize(request).await?;
    tracing::info!(
        model = %summary.model,
        chunks = summary.chunk_count,
        elapsed_seconds = summary.elapsed.as_secs_f64(),
        "Summary ready"
    );
    Ok(summary.text)
}
