//! Handler for the summarize tool.

use crate::processing::{
    FinalSummary, ReductionStage, SummaryApi, SummaryError, SummaryInput, SummaryRequest,
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use schemars::JsonSchema;
use serde::Serialize;

use super::parse_arguments;

/// Structured result of the `summarize` tool.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SummarizeToolOutput {
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

impl From<FinalSummary> for SummarizeToolOutput {
    fn from(summary: FinalSummary) -> Self {
        Self {
            elapsed_seconds: summary.elapsed.as_secs_f64(),
            summary: summary.text,
            model: summary.model,
            chunks: summary.chunk_count,
            skipped_chunks: summary.skipped_chunks,
            stage: summary.stage,
        }
    }
}

/// Handle the `summarize` tool: validate arguments, run the pipeline, and return the summary
/// with its run statistics.
pub(crate) async fn handle_summarize(
    service: &dyn SummaryApi,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let input: SummaryInput = parse_arguments(arguments)?;
    let request =
        SummaryRequest::from_input(input, service.default_budget()).map_err(map_summary_error)?;
    let summary = service
        .summarize(request)
        .await
        .map_err(map_summary_error)?;

    tracing::info!(
        model = %summary.model,
        chunks = summary.chunk_count,
        "Summarize tool completed"
    );

    let output = serde_json::to_value(SummarizeToolOutput::from(summary))
        .map_err(|err| McpError::internal_error(err.to_string(), None))?;
    Ok(CallToolResult::structured(output))
}

fn map_summary_error(error: SummaryError) -> McpError {
    if error.is_client_error() {
        McpError::invalid_params(error.to_string(), None)
    } else {
        McpError::internal_error(error.to_string(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::ValidationError;

    #[test]
    fn client_errors_become_invalid_params() {
        let error = map_summary_error(SummaryError::NoText);
        assert_eq!(error.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert_eq!(error.message, "No text to summarize.");

        let error = map_summary_error(ValidationError::AmbiguousSource.into());
        assert_eq!(error.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn pipeline_failures_become_internal_errors() {
        let error = map_summary_error(SummaryError::NothingSummarized { failed_chunks: 3 });
        assert_eq!(error.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert_eq!(error.message, "Could not generate a summary.");
    }
}
