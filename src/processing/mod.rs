//! Summarization pipeline: sanitize, chunk, summarize per chunk, reduce, and finalize.

pub mod budget;
pub mod chunking;
pub mod finalize;
pub mod reduce;
pub mod sanitize;
mod service;
mod summarize;
pub mod types;

pub use budget::{Budget, CHARS_PER_TOKEN, TokenBudget, ValidationError};
pub use service::{
    PipelineComponents, PipelineSettings, SummaryApi, SummaryPipeline, SummaryService,
};
pub use types::{
    ChunkSummary, ChunkingError, FinalSummary, ReductionStage, SummaryError, SummaryInput,
    SummaryRequest,
};
