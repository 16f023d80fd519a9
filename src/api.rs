//! HTTP surface for newsdigest.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /summarize` – Summarize raw text (`text`) or an article (`url`) within optional
//!   character bounds (`max_length`, `min_length`) using an optional `model` override.
//! - `GET /models` – Default model, models loaded so far, and the model capability table.
//! - `GET /metrics` – Pipeline counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The HTTP surface shares the same pipeline with the MCP server and the CLI, so behavior is
//! identical across interfaces.

use crate::metrics::MetricsSnapshot;
use crate::processing::{
    ReductionStage, SummaryApi, SummaryError, SummaryInput, SummaryRequest, ValidationError,
};
use crate::summarization::{ModelProfile, model_profiles};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SummaryApi + 'static,
{
    Router::new()
        .route("/summarize", post(summarize::<S>))
        .route("/models", get(get_models::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Success response for the `POST /summarize` endpoint.
#[derive(Serialize)]
struct SummarizeResponse {
    /// Final summary text.
    summary: String,
    /// Seconds spent summarizing chunks.
    elapsed_seconds: f64,
    /// Model that produced the summary.
    model: String,
    /// Number of chunks the article was split into.
    chunks: usize,
    /// Chunks dropped after a failure.
    skipped_chunks: usize,
    /// Reduction stage that produced the summary.
    stage: ReductionStage,
}

/// Summarize a document.
///
/// Exactly one of `text` or `url` must be present. Validation problems and empty input map to
/// `400`, article or model failures to `502`, and anything else to `500`. A body that does not
/// decode (for example a non-numeric `max_length`) is a validation problem too.
async fn summarize<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<SummaryInput>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, AppError>
where
    S: SummaryApi,
{
    let Json(input) = payload.map_err(|rejection| {
        SummaryError::from(ValidationError::MalformedBody(rejection.body_text()))
    })?;
    let request = SummaryRequest::from_input(input, service.default_budget())?;
    let summary = service.summarize(request).await?;
    tracing::info!(
        model = %summary.model,
        chunks = summary.chunk_count,
        skipped = summary.skipped_chunks,
        stage = ?summary.stage,
        "Summarize request completed"
    );
    Ok(Json(SummarizeResponse {
        elapsed_seconds: summary.elapsed.as_secs_f64(),
        summary: summary.text,
        model: summary.model,
        chunks: summary.chunk_count,
        skipped_chunks: summary.skipped_chunks,
        stage: summary.stage,
    }))
}

/// Response body for `GET /models`.
#[derive(Serialize)]
struct ModelsResponse {
    default_model: String,
    loaded: Vec<String>,
    profiles: Vec<ModelProfile>,
}

/// Describe the configured and loaded models plus the capability table.
async fn get_models<S>(State(service): State<Arc<S>>) -> Json<ModelsResponse>
where
    S: SummaryApi,
{
    Json(ModelsResponse {
        default_model: service.settings().default_model,
        loaded: service.loaded_models(),
        profiles: model_profiles(),
    })
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: SummaryApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize",
                description: "Summarize raw text or a news article URL within character bounds. Response returns { \"summary\": string, \"elapsed_seconds\": number, \"chunks\": number, \"stage\": \"combined\" | \"ranked\" }.",
                request_example: Some(json!({
                    "url": "https://sportowefakty.wp.pl/pilka-nozna/1",
                    "model": "llama3.2",
                    "max_length": 500,
                    "min_length": 200
                })),
            },
            CommandDescriptor {
                name: "models",
                method: "GET",
                path: "/models",
                description: "Return the default model, the models loaded so far, and the model capability table.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(SummaryError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_upstream_error() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<SummaryError> for AppError {
    fn from(inner: SummaryError) -> Self {
        Self(inner)
    }
}
