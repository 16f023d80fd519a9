//! JSON payloads for MCP resources.

use crate::summarization::ModelProfile;
use rmcp::model::ResourceContents;
use serde::Serialize;

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Pretty-print a resource payload, falling back to compact JSON.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Wrap serialized JSON as text resource contents.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

/// Payload of the `models` resource.
#[derive(Debug, Serialize)]
pub(crate) struct ModelsSnapshot {
    /// Model used when a request names none.
    pub(crate) default_model: String,
    /// Models initialized since startup.
    pub(crate) loaded: Vec<String>,
    /// Language and prompt style per model family.
    pub(crate) profiles: Vec<ModelProfile>,
}
