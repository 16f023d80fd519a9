//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{ModelsSnapshot, json_resource_contents, serialize_json},
        handlers::{metrics::handle_metrics, summarize::handle_summarize},
        registry, schemas,
    },
    processing::SummaryApi,
    summarization::model_profiles,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourceTemplatesResult,
        ListResourcesResult, ListToolsResult, PaginatedRequestParam, RawResource,
        ReadResourceRequestParam, ReadResourceResult, Resource, ServerCapabilities, ServerInfo,
        Tool, ToolAnnotations,
    },
    service::{RequestContext, RoleServer},
};

const MODELS_URI: &str = "mcp://models";
const SETTINGS_URI: &str = "mcp://settings";

/// MCP server exposing the summarization pipeline.
#[derive(Clone)]
pub struct NewsDigestMcpServer {
    service: Arc<dyn SummaryApi>,
    registry: Arc<registry::Registry>,
}

impl NewsDigestMcpServer {
    /// Create a server backed by `service`.
    pub fn new(service: Arc<dyn SummaryApi>) -> Self {
        let mut registry = registry::Registry::default();
        registry.register_resource(MODELS_URI, resource_models);
        registry.register_resource(SETTINGS_URI, resource_settings);

        registry.register_tool("summarize", tool_summarize);
        registry.register_tool("metrics", tool_metrics);

        Self {
            service,
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: Cow::Borrowed("summarize"),
                title: Some("Summarize Article".to_string()),
                description: Some(Cow::Borrowed(
                    "Summarize raw article text or a news URL within character bounds (max_length, min_length).",
                )),
                input_schema: Arc::new(schemas::summarize_input_schema()),
                output_schema: Some(Arc::new(schemas::summarize_output_schema())),
                annotations: Some(
                    ToolAnnotations::with_title("Summarize Article")
                        .read_only(true)
                        .idempotent(false)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("metrics"),
                title: Some("Pipeline Metrics".to_string()),
                description: Some(Cow::Borrowed(
                    "Report how many summaries and chunks the pipeline has produced since startup.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Pipeline Metrics")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut models = RawResource::new(MODELS_URI, "models");
        models.description =
            Some("Default model, models loaded so far, and per-model language profiles".into());

        let mut settings = RawResource::new(SETTINGS_URI, "settings");
        settings.description =
            Some("Effective pipeline settings: chunk size, failure policy, default lengths".into());

        vec![models.no_annotation(), settings.no_annotation()]
    }
}

fn resource_models(
    server: &NewsDigestMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let service = server.service.clone();
    Box::pin(async move {
        let payload = ModelsSnapshot {
            default_model: service.settings().default_model,
            loaded: service.loaded_models(),
            profiles: model_profiles(),
        };
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                MODELS_URI,
                serialize_json(&payload, MODELS_URI),
            )],
        })
    })
}

fn resource_settings(
    server: &NewsDigestMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let service = server.service.clone();
    Box::pin(async move {
        let settings = service.settings();
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(&settings, SETTINGS_URI),
            )],
        })
    })
}

fn tool_summarize(
    server: &NewsDigestMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let service = server.service.clone();
    Box::pin(async move { handle_summarize(service.as_ref(), request.arguments).await })
}

fn tool_metrics(
    server: &NewsDigestMcpServer,
    _request: CallToolRequestParam,
) -> registry::ToolFuture {
    let service = server.service.clone();
    Box::pin(async move { handle_metrics(service.as_ref()).await })
}

impl ServerHandler for NewsDigestMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "newsdigest".to_string();
        implementation.title = Some("News Digest MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to summarize news articles. Pass either raw text or a URL to `summarize`; read mcp://models to pick a model and mcp://settings for default lengths.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_
    {
        std::future::ready(Ok(ListResourceTemplatesResult::with_all_items(Vec::new())))
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    #[allow(clippy::manual_async_fn)]
    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.resources.get(request.uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tools.get(request.name.as_ref()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}
