//! Hand-written JSON Schemas for tool inputs.

use serde_json::{Map, Value};

use super::handlers::summarize::SummarizeToolOutput;

/// Input schema for the `summarize` tool.
pub(crate) fn summarize_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "text".into(),
        string_schema("Raw article text. Provide either text or url."),
    );
    properties.insert(
        "url".into(),
        string_schema("Article URL to fetch and extract. Provide either text or url."),
    );
    properties.insert(
        "model".into(),
        string_schema("Optional override for the summarization model"),
    );
    properties.insert(
        "max_length".into(),
        length_schema("Maximum summary length in characters (must be > 0)"),
    );
    properties.insert(
        "min_length".into(),
        length_schema("Minimum summary length in characters (must not exceed max_length)"),
    );
    finalize_object_schema(properties, &[])
}

/// Output schema for the `summarize` tool, derived from its result type.
pub(crate) fn summarize_output_schema() -> Map<String, Value> {
    match serde_json::to_value(schemars::schema_for!(SummarizeToolOutput)) {
        Ok(Value::Object(schema)) => schema,
        _ => Map::new(),
    }
}

/// Schema for tools that take no arguments.
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn length_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("integer".into()));
    schema.insert("description".into(), Value::String(description.into()));
    schema.insert("minimum".into(), Value::Number(1.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_schema_lists_request_fields() {
        let schema = summarize_input_schema();
        let properties = schema["properties"].as_object().expect("properties");
        for key in ["text", "url", "model", "max_length", "min_length"] {
            assert!(properties.contains_key(key), "missing {key}");
        }
        assert_eq!(properties["max_length"]["type"], "integer");
        assert!(!schema.contains_key("required"));
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
    }

    #[test]
    fn summarize_output_schema_uses_wire_names() {
        let schema = summarize_output_schema();
        assert_eq!(schema["type"], "object");
        let properties = schema["properties"].as_object().expect("properties");
        for key in ["summary", "elapsedSeconds", "model", "chunks", "skippedChunks", "stage"] {
            assert!(properties.contains_key(key), "missing {key}");
        }
    }
}
