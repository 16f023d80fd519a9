use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct PipelineMetrics {
    summaries_generated: AtomicU64,
    chunks_summarized: AtomicU64,
    chunks_skipped: AtomicU64,
    ranked_reductions: AtomicU64,
    failed_requests: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed run along with its chunk counters.
    pub fn record_summary(&self, summarized: u64, skipped: u64, ranked: bool) {
        self.summaries_generated.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(summarized, Ordering::Relaxed);
        self.chunks_skipped.fetch_add(skipped, Ordering::Relaxed);
        if ranked {
            self.ranked_reductions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a run that ended without a summary.
    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            chunks_skipped: self.chunks_skipped.load(Ordering::Relaxed),
            ranked_reductions: self.ranked_reductions.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of summaries returned since startup.
    pub summaries_generated: u64,
    /// Chunks that produced a model summary.
    pub chunks_summarized: u64,
    /// Chunks dropped after a summarization failure.
    pub chunks_skipped: u64,
    /// Runs that needed the ranked (second) reduction stage.
    pub ranked_reductions: u64,
    /// Runs that ended in an error.
    pub failed_requests: u64,
}
