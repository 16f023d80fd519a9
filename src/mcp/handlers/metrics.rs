//! Handler for the metrics tool.

use crate::processing::SummaryApi;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `metrics` tool, returning the pipeline counters.
pub(crate) async fn handle_metrics(service: &dyn SummaryApi) -> Result<CallToolResult, McpError> {
    let snapshot = service.metrics_snapshot();
    Ok(CallToolResult::structured(json!({
        "summariesGenerated": snapshot.summaries_generated,
        "chunksSummarized": snapshot.chunks_summarized,
        "chunksSkipped": snapshot.chunks_skipped,
        "rankedReductions": snapshot.ranked_reductions,
        "failedRequests": snapshot.failed_requests,
    })))
}
