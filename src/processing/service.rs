//! Summary pipeline coordinating acquisition, chunk summarization, and reduction.

use crate::{
    acquisition::{ArticleSource, Locator, TextSource},
    config::{ChunkFailurePolicy, Config},
    embedding::{EmbeddingClient, get_embedding_client},
    history::{SummaryLog, SummaryRecord},
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        budget::{Budget, TokenBudget, ValidationError},
        chunking::{Chunk, TokenCounter, build_token_counter, chunk_text},
        finalize::finalize,
        reduce::reduce,
        sanitize::sanitize,
        summarize::ChunkSummarizer,
        types::{FinalSummary, ReductionStage, SummaryError, SummaryRequest},
    },
    summarization::{
        ModelRegistry, OllamaSummarizerFactory, OllamaTranslator, Translator, profile_for,
    },
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Settings the pipeline needs from configuration.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSettings {
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Language of incoming articles (ISO code).
    pub document_language: String,
    /// Chunk ceiling in characters.
    pub max_chunk_chars: usize,
    /// What to do when a chunk fails.
    pub failure_policy: ChunkFailurePolicy,
    /// Budget applied when a request omits lengths.
    pub default_budget: Budget,
}

impl PipelineSettings {
    /// Derive settings from the process configuration.
    pub fn from_config(config: &Config) -> Result<Self, ValidationError> {
        Ok(Self {
            default_model: config.summarization_model.clone(),
            document_language: config.document_language.clone(),
            max_chunk_chars: config.max_chunk_chars,
            failure_policy: config.chunk_failure_policy,
            default_budget: Budget::new(
                config.default_max_length as i64,
                config.default_min_length as i64,
            )?,
        })
    }
}

/// Capabilities the pipeline delegates to.
pub struct PipelineComponents {
    /// Turns locators into text.
    pub source: Arc<dyn TextSource>,
    /// Per-model client cache.
    pub registry: Arc<ModelRegistry>,
    /// Translator for the translate-around variant.
    pub translator: Arc<dyn Translator>,
    /// Embeddings for salience ranking.
    pub embedder: Arc<dyn EmbeddingClient>,
    /// Optional CSV log of successful runs.
    pub summary_log: Option<SummaryLog>,
}

/// End-to-end summarization: acquire, sanitize, chunk, summarize, reduce, finalize.
///
/// Runs are independent; only the model registry, metrics, and the summary log are shared.
pub struct SummaryPipeline {
    settings: PipelineSettings,
    components: PipelineComponents,
    token_counter: TokenCounter,
    metrics: Arc<PipelineMetrics>,
}

impl SummaryPipeline {
    /// Assemble a pipeline from explicit components.
    pub fn new(settings: PipelineSettings, components: PipelineComponents) -> Self {
        let token_counter = build_token_counter(&settings.default_model);
        Self {
            settings,
            components,
            token_counter,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build the production pipeline (Ollama models, HTTP article fetching) from `config`.
    pub fn from_config(config: &Config) -> Result<Self, SummaryError> {
        let settings = PipelineSettings::from_config(config)?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let factory = OllamaSummarizerFactory::new(config.ollama_url.clone(), timeout).map_err(
            |source| SummaryError::ModelInit {
                model: config.summarization_model.clone(),
                source,
            },
        )?;
        let translator = OllamaTranslator::new(
            config.ollama_url.clone(),
            config.translation_model.clone(),
            timeout,
        )
        .map_err(|source| SummaryError::ModelInit {
            model: config.translation_model.clone(),
            source,
        })?;
        let embedder = get_embedding_client(config)?;
        let source = ArticleSource::new(Duration::from_secs(config.fetch_timeout_secs))?;

        tracing::info!(
            ollama_url = %config.ollama_url,
            model = %settings.default_model,
            embedding_provider = ?config.embedding_provider,
            summary_log = ?config.summary_log_path,
            "Summary pipeline initialized"
        );

        Ok(Self::new(
            settings,
            PipelineComponents {
                source: Arc::new(source),
                registry: Arc::new(ModelRegistry::new(Arc::new(factory))),
                translator: Arc::new(translator),
                embedder,
                summary_log: config.summary_log_path.as_deref().map(SummaryLog::new),
            },
        ))
    }

    /// Settings the pipeline runs with.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Models initialized so far.
    pub fn loaded_models(&self) -> Vec<String> {
        self.components.registry.loaded_models()
    }

    /// Current pipeline counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Produce a bounded-length summary for `request`.
    pub async fn get_summary(&self, request: SummaryRequest) -> Result<FinalSummary, SummaryError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("summarize", %run_id);
        let started = Instant::now();

        let result = self.run(request).instrument(span.clone()).await;
        span.in_scope(|| match &result {
            Ok(summary) => {
                self.record_success(summary);
                tracing::info!(
                    model = %summary.model,
                    chunks = summary.chunk_count,
                    skipped = summary.skipped_chunks,
                    stage = ?summary.stage,
                    output_chars = summary.text.chars().count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Summary generated"
                );
            }
            Err(error) => {
                self.metrics.record_failure();
                tracing::warn!(error = %error, "Summarization failed");
            }
        });
        result
    }

    async fn run(&self, request: SummaryRequest) -> Result<FinalSummary, SummaryError> {
        let SummaryRequest {
            source,
            model,
            budget,
        } = request;

        let locator_is_blank = match &source {
            Locator::Text(text) | Locator::Url(text) => text.trim().is_empty(),
        };
        if locator_is_blank {
            return Err(SummaryError::NoText);
        }

        let model = model
            .map(|model| model.trim().to_string())
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| self.settings.default_model.clone());
        tracing::info!(source = %source.describe(), model = %model, "Summarizing");

        let raw = self.components.source.acquire(&source).await?;
        let document = raw.trim();
        if document.is_empty() {
            return Err(SummaryError::NoText);
        }
        let input_chars = document.chars().count();

        let profile = profile_for(&model);
        let variant = profile.variant_for(&self.settings.document_language);
        let client = self
            .components
            .registry
            .client(&model)
            .await
            .map_err(|source| SummaryError::ModelInit {
                model: model.clone(),
                source,
            })?;

        let tokens = TokenBudget::from_budget(&budget);
        let sanitized = sanitize(document);
        let chunks: Vec<Chunk<'_>> = chunk_text(&sanitized, self.settings.max_chunk_chars)?.collect();
        if chunks.is_empty() {
            return Err(SummaryError::NoText);
        }
        tracing::debug!(
            input_chars,
            sanitized_chars = sanitized.chars().count(),
            chunks = chunks.len(),
            max_tokens = tokens.max_tokens,
            min_tokens = tokens.min_tokens,
            variant = ?variant,
            "Document chunked"
        );

        let summarizer = ChunkSummarizer {
            client,
            translator: self.components.translator.clone(),
            model: model.clone(),
            profile,
            variant,
            token_counter: self.token_counter.clone(),
            policy: self.settings.failure_policy,
        };
        let started = Instant::now();
        let outcome = summarizer.summarize_all(&chunks, tokens).await?;
        let elapsed = started.elapsed();

        if outcome.summaries.is_empty() {
            return Err(SummaryError::NothingSummarized {
                failed_chunks: outcome.skipped.len(),
            });
        }

        let reduction = reduce(
            &outcome.summaries,
            &budget,
            self.components.embedder.as_ref(),
        )
        .await?;
        let text = finalize(&reduction.text, budget.max_length());

        Ok(FinalSummary {
            text,
            elapsed,
            model,
            chunk_count: chunks.len(),
            skipped_chunks: outcome.skipped.len(),
            stage: reduction.stage,
            input_chars,
        })
    }

    fn record_success(&self, summary: &FinalSummary) {
        let summarized = summary.chunk_count.saturating_sub(summary.skipped_chunks);
        self.metrics.record_summary(
            summarized as u64,
            summary.skipped_chunks as u64,
            summary.stage == ReductionStage::Ranked,
        );

        if let Some(log) = &self.components.summary_log {
            let record = SummaryRecord {
                input_chars: summary.input_chars,
                model: &summary.model,
                summary: &summary.text,
                elapsed: summary.elapsed,
            };
            if let Err(error) = log.append(&record) {
                tracing::warn!(
                    path = %log.path().display(),
                    error = %error,
                    "Failed to append summary log"
                );
            }
        }
    }
}

/// Abstraction over the pipeline used by external surfaces (HTTP, MCP, CLI).
#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// Summarize the requested document.
    async fn summarize(&self, request: SummaryRequest) -> Result<FinalSummary, SummaryError>;

    /// Budget applied when a caller omits lengths.
    fn default_budget(&self) -> Budget;

    /// Settings exposed for diagnostics.
    fn settings(&self) -> PipelineSettings;

    /// Models initialized so far.
    fn loaded_models(&self) -> Vec<String>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Shared handle that runs each request on its own task.
///
/// A panic inside a run is reported as [`SummaryError::Unexpected`] instead of unwinding into
/// the caller.
#[derive(Clone)]
pub struct SummaryService {
    pipeline: Arc<SummaryPipeline>,
}

impl SummaryService {
    /// Wrap a pipeline.
    pub fn new(pipeline: SummaryPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Build the production service from `config`.
    pub fn from_config(config: &Config) -> Result<Self, SummaryError> {
        SummaryPipeline::from_config(config).map(Self::new)
    }

    /// Run the pipeline on a spawned task, converting panics into errors.
    pub async fn summarize_guarded(
        &self,
        request: SummaryRequest,
    ) -> Result<FinalSummary, SummaryError> {
        let pipeline = Arc::clone(&self.pipeline);
        match tokio::spawn(async move { pipeline.get_summary(request).await }).await {
            Ok(result) => result,
            Err(join_error) => {
                tracing::error!(error = %join_error, "Summarization task aborted");
                self.pipeline.metrics.record_failure();
                Err(SummaryError::Unexpected(join_error.to_string()))
            }
        }
    }
}

#[async_trait]
impl SummaryApi for SummaryService {
    async fn summarize(&self, request: SummaryRequest) -> Result<FinalSummary, SummaryError> {
        self.summarize_guarded(request).await
    }

    fn default_budget(&self) -> Budget {
        self.pipeline.settings.default_budget
    }

    fn settings(&self) -> PipelineSettings {
        self.pipeline.settings.clone()
    }

    fn loaded_models(&self) -> Vec<String> {
        self.pipeline.loaded_models()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.pipeline.metrics_snapshot()
    }
}
