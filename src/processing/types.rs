//! Core data types and error definitions for the summarization pipeline.

use crate::{
    acquisition::{AcquisitionError, Locator},
    embedding::EmbeddingClientError,
    summarization::SummarizationClientError,
};
use anyhow::Error as TokenizerError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::budget::{Budget, ValidationError};

/// Errors produced while turning sanitized text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// The configured chunk ceiling is zero.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Tokenizer resources were unavailable for the requested model.
    #[error("failed to initialize tokenizer for model '{model}': {source}")]
    Tokenizer {
        /// Model or encoding we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Single error type funnelled from the pipeline to every surface.
///
/// `Display` yields the message shown to end users.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Input was empty or whitespace only.
    #[error("No text to summarize.")]
    NoText,
    /// Every chunk failed to summarize.
    #[error("Could not generate a summary.")]
    NothingSummarized {
        /// Number of chunks that failed.
        failed_chunks: usize,
    },
    /// Budget input was rejected.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// Article text could not be acquired.
    #[error("{0}")]
    Acquisition(#[from] AcquisitionError),
    /// The summarization model could not be initialized.
    #[error("Model '{model}' could not be loaded: {source}")]
    ModelInit {
        /// Requested model identifier.
        model: String,
        /// Provider failure.
        #[source]
        source: SummarizationClientError,
    },
    /// Salience ranking could not embed the chunk summaries.
    #[error("Failed to rank summaries: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// A chunk failed under the fail-fast policy.
    #[error("Summarizing chunk {index} failed: {source}")]
    ChunkFailed {
        /// Index of the failed chunk.
        index: usize,
        /// Provider failure.
        #[source]
        source: SummarizationClientError,
    },
    /// The chunker rejected its configuration.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Anything else, including a panicked run.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl SummaryError {
    /// Whether the caller supplied unusable input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoText
                | Self::Validation(_)
                | Self::Acquisition(AcquisitionError::InvalidLocator(_))
        )
    }

    /// Whether a dependency (article host, model runtime) failed.
    pub fn is_upstream_error(&self) -> bool {
        match self {
            Self::Acquisition(error) => !matches!(error, AcquisitionError::InvalidLocator(_)),
            Self::ModelInit { .. }
            | Self::NothingSummarized { .. }
            | Self::ChunkFailed { .. }
            | Self::Embedding(_) => true,
            _ => false,
        }
    }
}

/// One summarization request as accepted by [`crate::processing::SummaryPipeline`].
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// Raw text or article URL.
    pub source: Locator,
    /// Model override; the configured default is used when absent.
    pub model: Option<String>,
    /// Output length bounds.
    pub budget: Budget,
}

impl SummaryRequest {
    /// Build a request from loosely typed surface input.
    ///
    /// Exactly one of `text` or `url` must carry content; missing lengths fall back to
    /// `defaults`.
    pub fn from_input(input: SummaryInput, defaults: Budget) -> Result<Self, SummaryError> {
        let SummaryInput {
            text,
            url,
            model,
            max_length,
            min_length,
        } = input;
        let present = |value: Option<String>| value.filter(|value| !value.trim().is_empty());

        let source = match (present(text), present(url)) {
            (Some(_), Some(_)) => return Err(ValidationError::AmbiguousSource.into()),
            (Some(text), None) => Locator::Text(text),
            (None, Some(url)) => Locator::Url(url),
            (None, None) => return Err(SummaryError::NoText),
        };
        let budget = Budget::resolve(max_length, min_length, defaults)?;

        Ok(Self {
            source,
            model,
            budget,
        })
    }
}

/// Request fields as received by the HTTP, MCP, and CLI surfaces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryInput {
    /// Raw article text.
    #[serde(default)]
    pub text: Option<String>,
    /// Article URL to fetch.
    #[serde(default)]
    pub url: Option<String>,
    /// Model override.
    #[serde(default)]
    pub model: Option<String>,
    /// Maximum summary length in characters.
    #[serde(default)]
    pub max_length: Option<i64>,
    /// Minimum summary length in characters.
    #[serde(default)]
    pub min_length: Option<i64>,
}

/// Summary of one chunk, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    /// Index of the source chunk.
    pub index: usize,
    /// Generated summary text.
    pub text: String,
}

/// Which reduction stage produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReductionStage {
    /// Chunk summaries concatenated in order.
    Combined,
    /// Chunk summaries selected by salience.
    Ranked,
}

/// Terminal artifact of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalSummary {
    /// Summary text.
    pub text: String,
    /// Wall-clock time spent summarizing chunks.
    pub elapsed: Duration,
    /// Model that produced the summary.
    pub model: String,
    /// Number of chunks the document was split into.
    pub chunk_count: usize,
    /// Number of chunks dropped after a failure.
    pub skipped_chunks: usize,
    /// Reduction stage that produced `text`.
    pub stage: ReductionStage,
    /// Length of the acquired input in characters.
    pub input_chars: usize,
}
