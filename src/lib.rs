#![deny(missing_docs)]

//! Core library for newsdigest: fetch a news article (or take raw text) and condense it into a
//! summary that fits a character budget.

/// Raw-text passthrough and article fetching/extraction.
pub mod acquisition;
/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// CSV log of completed summaries.
pub mod history;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Summarization counters.
pub mod metrics;
/// Summarization pipeline stages and the service wrapping them.
pub mod processing;
/// Generation and translation clients plus the model registry.
pub mod summarization;
