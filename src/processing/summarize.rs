//! Per-chunk summarization.

use std::sync::Arc;

use crate::{
    config::ChunkFailurePolicy,
    summarization::{
        GenerationConfig, ModelProfile, ProcessingVariant, SummarizationClient,
        SummarizationClientError, SummarizationRequest, Translator,
    },
};

use super::{
    budget::TokenBudget,
    chunking::{Chunk, TokenCounter},
    types::{ChunkSummary, SummaryError},
};

/// Outcome of summarizing every chunk of a document.
#[derive(Debug, Default)]
pub(crate) struct ChunkOutcome {
    pub(crate) summaries: Vec<ChunkSummary>,
    pub(crate) skipped: Vec<usize>,
}

/// Summarizes chunks with one model under one processing variant.
pub(crate) struct ChunkSummarizer {
    pub(crate) client: Arc<dyn SummarizationClient>,
    pub(crate) translator: Arc<dyn Translator>,
    pub(crate) model: String,
    pub(crate) profile: ModelProfile,
    pub(crate) variant: ProcessingVariant,
    pub(crate) token_counter: TokenCounter,
    pub(crate) policy: ChunkFailurePolicy,
}

impl ChunkSummarizer {
    /// Summarize a single chunk under `budget`.
    ///
    /// An empty model response is a failure.
    pub(crate) async fn summarize_chunk(
        &self,
        chunk_text: &str,
        budget: TokenBudget,
    ) -> Result<String, SummarizationClientError> {
        match &self.variant {
            ProcessingVariant::Direct => self.generate(chunk_text, budget).await,
            ProcessingVariant::TranslateSummarizeTranslate { source, pivot } => {
                let translated = self.translator.translate(chunk_text, source, pivot).await?;
                let summary = self.generate(&translated, budget).await?;
                let back = self.translator.translate(&summary, pivot, source).await?;
                non_empty(back)
            }
        }
    }

    /// Summarize `chunks` in order, applying the failure policy.
    pub(crate) async fn summarize_all(
        &self,
        chunks: &[Chunk<'_>],
        global: TokenBudget,
    ) -> Result<ChunkOutcome, SummaryError> {
        let mut outcome = ChunkOutcome::default();
        for chunk in chunks {
            let chunk_tokens = self.token_counter.as_ref()(chunk.text);
            let budget = global.for_chunk(chunk_tokens);
            tracing::debug!(
                chunk = chunk.index,
                chunk_tokens,
                max_tokens = budget.max_tokens,
                min_tokens = budget.min_tokens,
                "Summarizing chunk"
            );

            match self.summarize_chunk(chunk.text, budget).await {
                Ok(text) => outcome.summaries.push(ChunkSummary {
                    index: chunk.index,
                    text,
                }),
                Err(source) => match self.policy {
                    ChunkFailurePolicy::Skip => {
                        tracing::warn!(
                            chunk = chunk.index,
                            error = %source,
                            "Chunk summarization failed; skipping"
                        );
                        outcome.skipped.push(chunk.index);
                    }
                    ChunkFailurePolicy::FailFast => {
                        return Err(SummaryError::ChunkFailed {
                            index: chunk.index,
                            source,
                        });
                    }
                },
            }
        }
        Ok(outcome)
    }

    async fn generate(
        &self,
        text: &str,
        budget: TokenBudget,
    ) -> Result<String, SummarizationClientError> {
        let request = SummarizationRequest {
            model: self.model.clone(),
            prompt: self
                .profile
                .build_prompt(text, budget.max_tokens, budget.min_tokens),
            config: GenerationConfig::deterministic(budget.max_tokens, budget.min_tokens),
        };
        non_empty(self.client.generate_summary(request).await?)
    }
}

fn non_empty(text: String) -> Result<String, SummarizationClientError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SummarizationClientError::InvalidResponse(
            "model returned an empty summary".into(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::chunking::default_token_counter;
    use crate::summarization::profile_for;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the prompt body; fails on "FAIL" and answers blank on "EMPTY".
    #[derive(Default)]
    struct ScriptedClient {
        requests: Mutex<Vec<SummarizationRequest>>,
    }

    #[async_trait]
    impl SummarizationClient for ScriptedClient {
        async fn generate_summary(
            &self,
            request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            self.requests.lock().unwrap().push(request.clone());
            if request.prompt.contains("FAIL") {
                return Err(SummarizationClientError::GenerationFailed("boom".into()));
            }
            if request.prompt.contains("EMPTY") {
                return Ok("   ".into());
            }
            let body = request.prompt.trim_start_matches("summarize: ");
            Ok(format!("summary of {body}"))
        }
    }

    struct TaggingTranslator;

    #[async_trait]
    impl Translator for TaggingTranslator {
        async fn translate(
            &self,
            text: &str,
            from: &str,
            to: &str,
        ) -> Result<String, SummarizationClientError> {
            Ok(format!("[{from}->{to}] {text}"))
        }
    }

    fn summarizer(
        client: Arc<ScriptedClient>,
        model: &str,
        variant: ProcessingVariant,
        policy: ChunkFailurePolicy,
    ) -> ChunkSummarizer {
        ChunkSummarizer {
            client,
            translator: Arc::new(TaggingTranslator),
            model: model.to_string(),
            profile: profile_for(model),
            variant,
            token_counter: default_token_counter(),
            policy,
        }
    }

    fn chunks<'a>(texts: &[&'a str]) -> Vec<Chunk<'a>> {
        texts
            .iter()
            .enumerate()
            .map(|(index, &text)| Chunk { index, text })
            .collect()
    }

    const GLOBAL: TokenBudget = TokenBudget {
        max_tokens: 125,
        min_tokens: 50,
    };

    #[tokio::test]
    async fn direct_variant_uses_deterministic_policy() {
        let client = Arc::new(ScriptedClient::default());
        let summarizer = summarizer(
            client.clone(),
            "t5-small",
            ProcessingVariant::Direct,
            ChunkFailurePolicy::Skip,
        );

        let summary = summarizer
            .summarize_chunk("Chunk body.", GLOBAL.for_chunk(100))
            .await
            .expect("summary");
        assert_eq!(summary, "summary of Chunk body.");

        let requests = client.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, "t5-small");
        assert_eq!(request.prompt, "summarize: Chunk body.");
        assert_eq!(request.config, GenerationConfig::deterministic(60, 40));
        assert_eq!(request.config.num_beams, 4);
        assert_eq!(request.config.no_repeat_ngram_size, 3);
        assert!(!request.config.do_sample);
    }

    #[tokio::test]
    async fn translate_variant_wraps_the_model_call() {
        let client = Arc::new(ScriptedClient::default());
        let summarizer = summarizer(
            client.clone(),
            "t5-small",
            ProcessingVariant::TranslateSummarizeTranslate {
                source: "pl".into(),
                pivot: "en".into(),
            },
            ChunkFailurePolicy::Skip,
        );

        let summary = summarizer
            .summarize_chunk("Tekst.", GLOBAL)
            .await
            .expect("summary");
        assert_eq!(summary, "[en->pl] summary of [pl->en] Tekst.");
    }

    #[tokio::test]
    async fn empty_model_output_is_a_failure() {
        let summarizer = summarizer(
            Arc::new(ScriptedClient::default()),
            "llama3.2",
            ProcessingVariant::Direct,
            ChunkFailurePolicy::Skip,
        );
        let error = summarizer.summarize_chunk("EMPTY", GLOBAL).await.unwrap_err();
        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn skip_policy_drops_failed_chunks() {
        let summarizer = summarizer(
            Arc::new(ScriptedClient::default()),
            "t5-small",
            ProcessingVariant::Direct,
            ChunkFailurePolicy::Skip,
        );
        let outcome = summarizer
            .summarize_all(&chunks(&["first", "FAIL here", "third"]), GLOBAL)
            .await
            .expect("outcome");

        let indexes: Vec<usize> = outcome.summaries.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![0, 2]);
        assert_eq!(outcome.skipped, vec![1]);
    }

    #[tokio::test]
    async fn fail_fast_policy_aborts_on_first_failure() {
        let client = Arc::new(ScriptedClient::default());
        let summarizer = summarizer(
            client.clone(),
            "t5-small",
            ProcessingVariant::Direct,
            ChunkFailurePolicy::FailFast,
        );
        let error = summarizer
            .summarize_all(&chunks(&["first", "FAIL here", "third"]), GLOBAL)
            .await
            .unwrap_err();

        assert!(matches!(error, SummaryError::ChunkFailed { index: 1, .. }));
        assert_eq!(client.requests.lock().unwrap().len(), 2);
    }
}
