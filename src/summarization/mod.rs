//! Abstractive summarization backed by a local Ollama runtime.
//!
//! The pipeline treats summarization as a black box: text plus a [`GenerationConfig`] in,
//! summary text out. The Ollama adapter maps the decoding policy onto the options Ollama
//! understands; model selection is passed through unchanged. Clients are created through a
//! [`SummarizerFactory`] and cached per model by [`ModelRegistry`].

mod profile;
mod registry;

pub use profile::{ModelProfile, ProcessingVariant, PromptStyle, model_profiles, profile_for};
pub use registry::{ModelRegistry, SummarizerFactory};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while attempting abstractive summarization or translation.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was unreachable or the requested model is not installed.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed or was empty.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Decoding policy handed to the summarization capability.
///
/// Fields mirror the usual seq2seq generation knobs. Backends apply the subset they support.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    /// Upper bound on generated tokens.
    pub max_new_tokens: usize,
    /// Lower bound on generated tokens.
    pub min_length: usize,
    /// Beam width for beam search.
    pub num_beams: u32,
    /// Size of n-grams that may not repeat in the output.
    pub no_repeat_ngram_size: u32,
    /// Penalty applied to already generated tokens.
    pub repetition_penalty: f32,
    /// Whether sampling is enabled; `false` means deterministic decoding.
    pub do_sample: bool,
    /// Stop beam search once every beam has finished.
    pub early_stopping: bool,
}

impl GenerationConfig {
    /// Deterministic beam-search policy used for every chunk.
    pub fn deterministic(max_new_tokens: usize, min_length: usize) -> Self {
        Self {
            max_new_tokens,
            min_length,
            num_beams: 4,
            no_repeat_ngram_size: 3,
            repetition_penalty: 2.0,
            do_sample: false,
            early_stopping: true,
        }
    }

    fn ollama_options(&self) -> Value {
        let mut options = json!({
            "num_predict": self.max_new_tokens,
            "repeat_penalty": self.repetition_penalty,
            "repeat_last_n": self.no_repeat_ngram_size.max(1) * 16,
        });
        if !self.do_sample {
            options["temperature"] = json!(0.0);
            options["top_k"] = json!(1);
        }
        options
    }
}

/// Request payload passed to the summarization provider.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// Prompt assembled by the pipeline from the model's prompt style.
    pub prompt: String,
    /// Decoding policy for this call.
    pub config: GenerationConfig,
}

/// Interface implemented by abstractive summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Generate a summary using the requested model.
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

/// Interface implemented by translation providers used by the translate-around variant.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from language `from` into language `to` (ISO codes).
    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
    ) -> Result<String, SummarizationClientError>;
}

/// Thin HTTP transport shared by the Ollama summarizer, translator, and factory.
#[derive(Clone)]
struct OllamaTransport {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

impl OllamaTransport {
    fn new(base_url: String, timeout: Duration) -> Result<Self, SummarizationClientError> {
        let http = Client::builder()
            .user_agent("newsdigest/summary")
            .timeout(timeout)
            .build()
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: Value,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "options": options,
        });

        let response = self
            .http
            .post(self.endpoint("/api/generate"))
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "Ollama has no model '{model}' (404 from {})",
                self.endpoint("/api/generate")
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        let text = body.response.trim();
        if text.is_empty() {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama returned an empty response".into(),
            ));
        }
        Ok(text.to_string())
    }

    async fn ensure_model(&self, model: &str) -> Result<(), SummarizationClientError> {
        let response = self
            .http
            .post(self.endpoint("/api/show"))
            .json(&json!({ "model": model }))
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(SummarizationClientError::ProviderUnavailable(format!(
                "model '{model}' is not installed in Ollama; run `ollama pull {model}`"
            ))),
            status => Err(SummarizationClientError::ProviderUnavailable(format!(
                "Ollama rejected model lookup for '{model}' with {status}"
            ))),
        }
    }
}

/// Summarization client issuing `/api/generate` calls against Ollama.
pub struct OllamaSummarizationClient {
    transport: OllamaTransport,
}

#[async_trait]
impl SummarizationClient for OllamaSummarizationClient {
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        if request.config.num_beams > 1 {
            tracing::trace!(
                beams = request.config.num_beams,
                "Beam search unsupported by Ollama; decoding greedily"
            );
        }
        self.transport
            .generate(
                &request.model,
                &request.prompt,
                request.config.ollama_options(),
            )
            .await
    }
}

/// Factory that verifies a model exists in Ollama before handing out a client.
pub struct OllamaSummarizerFactory {
    transport: OllamaTransport,
}

impl OllamaSummarizerFactory {
    /// Build a factory for the Ollama runtime at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SummarizationClientError> {
        Ok(Self {
            transport: OllamaTransport::new(base_url.into(), timeout)?,
        })
    }
}

#[async_trait]
impl SummarizerFactory for OllamaSummarizerFactory {
    async fn create(
        &self,
        model: &str,
    ) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
        tracing::info!(model, "Loading summarization model");
        self.transport.ensure_model(model).await?;
        Ok(Arc::new(OllamaSummarizationClient {
            transport: self.transport.clone(),
        }))
    }
}

/// Translator backed by an Ollama model prompted for translation.
pub struct OllamaTranslator {
    transport: OllamaTransport,
    model: String,
}

impl OllamaTranslator {
    /// Build a translator that prompts `model` on the Ollama runtime at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizationClientError> {
        Ok(Self {
            transport: OllamaTransport::new(base_url.into(), timeout)?,
            model: model.into(),
        })
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
    ) -> Result<String, SummarizationClientError> {
        let prompt = format!(
            "Translate the following text from {} to {}. Output only the translation.\n\n{text}",
            language_name(from),
            language_name(to)
        );
        self.transport
            .generate(&self.model, &prompt, json!({ "temperature": 0.0 }))
            .await
    }
}

/// Human-readable language name for prompts, falling back to the raw code.
pub(crate) fn language_name(code: &str) -> &str {
    match code {
        "pl" => "Polish",
        "en" => "English",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "cs" => "Czech",
        "uk" => "Ukrainian",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn transport(server: &MockServer) -> OllamaTransport {
        OllamaTransport::new(server.base_url(), Duration::from_secs(5)).expect("transport")
    }

    #[tokio::test]
    async fn ollama_client_handles_successful_response() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationClient {
            transport: transport(&server),
        };

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body_partial(r#"{"options":{"num_predict":120,"temperature":0.0}}"#);
                then.status(200).json_body(json!({
                    "response": "  Summary text ",
                    "done": true
                }));
            })
            .await;

        let summary = client
            .generate_summary(SummarizationRequest {
                model: "llama3.2".into(),
                prompt: "Summarize".into(),
                config: GenerationConfig::deterministic(120, 40),
            })
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "Summary text");
    }

    #[tokio::test]
    async fn ollama_client_handles_error_status() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationClient {
            transport: transport(&server),
        };

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client
            .generate_summary(SummarizationRequest {
                model: "llama3.2".into(),
                prompt: "Summarize".into(),
                config: GenerationConfig::deterministic(120, 40),
            })
            .await
            .expect_err("error response");

        assert!(
            matches!(error, SummarizationClientError::GenerationFailed(ref message) if message.contains("500"))
        );
    }

    #[tokio::test]
    async fn empty_response_is_rejected() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationClient {
            transport: transport(&server),
        };
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .json_body(json!({ "response": "   ", "done": true }));
            })
            .await;

        let error = client
            .generate_summary(SummarizationRequest {
                model: "llama3.2".into(),
                prompt: "Summarize".into(),
                config: GenerationConfig::deterministic(60, 20),
            })
            .await
            .expect_err("empty response");
        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn factory_reports_missing_model() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/show");
                then.status(404).body("model not found");
            })
            .await;

        let factory =
            OllamaSummarizerFactory::new(server.base_url(), Duration::from_secs(5)).expect("factory");
        let error = match factory.create("missing-model").await {
            Ok(_) => panic!("missing model must not produce a client"),
            Err(error) => error,
        };
        assert!(error.to_string().contains("ollama pull missing-model"));
    }

    #[test]
    fn deterministic_policy_disables_sampling() {
        let config = GenerationConfig::deterministic(80, 30);
        assert!(!config.do_sample);
        assert_eq!(config.num_beams, 4);
        let options = config.ollama_options();
        assert_eq!(options["num_predict"], 80);
        assert_eq!(options["top_k"], 1);
    }
}
