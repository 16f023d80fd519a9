//! Model Context Protocol surface: `summarize` and `metrics` tools plus read-only resources
//! describing the configured models and pipeline settings.

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::NewsDigestMcpServer;
