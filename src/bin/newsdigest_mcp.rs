//! MCP server entrypoint (stdio transport).
//!
//! Exposes the summarization tools and resources over stdio for editor and agent hosts. Logs go
//! to a file so stdout stays reserved for protocol frames.
use anyhow::{Context, Result};
use newsdigest::{config, logging, mcp::NewsDigestMcpServer, processing::SummaryService};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_tracing_for_stdio();

    let service = SummaryService::from_config(config::get_config())
        .context("failed to build summarization pipeline")?;
    let server = NewsDigestMcpServer::new(Arc::new(service));

    let running = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    running
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
