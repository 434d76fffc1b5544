//! Batch decode request configuration.

use logsleuth_core::decoder::ErrorMode;
use logsleuth_core::event::RawLog;

/// Configuration for a batch decode job.
pub struct BatchRequest {
    /// The raw log rows to decode
    pub logs: Vec<RawLog>,
    /// Max rows per chunk (memory bound for very large backfills)
    pub chunk_size: usize,
    /// How to handle rows that fail structural decoding
    pub error_mode: ErrorMode,
    /// Optional progress callback, called after each chunk
    pub on_progress: Option<Box<dyn Fn(usize, usize) + Send + Sync>>,
}

impl BatchRequest {
    pub fn new(logs: Vec<RawLog>) -> Self {
        Self {
            logs,
            chunk_size: 10_000,
            error_mode: ErrorMode::Skip,
            on_progress: None,
        }
    }

    pub fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }

    pub fn error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    pub fn on_progress<F: Fn(usize, usize) + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }
}
