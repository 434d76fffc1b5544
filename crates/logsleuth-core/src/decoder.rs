//! The `LogDecoder` trait and batch plumbing.
//!
//! The trait is object-safe so decoders can be stored as
//! `Arc<dyn LogDecoder>` in the batch engine. Implementations must be
//! `Send + Sync`: decoding independent rows has no data dependency and is
//! parallelized freely over a shared, immutable catalog.

use crate::error::{BatchError, DecodeError};
use crate::event::{DecodeStatus, DecodedEvent, EventLookup, RawLog};
use crate::signature::{selector_from_topics, Selector};

/// Callback invoked during long-running batch decodes.
/// `done` is the number of rows processed so far; `total` the batch size.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, done: usize, total: usize);
}

/// Blanket impl so closures can be used as progress callbacks.
impl<F: Fn(usize, usize) + Send + Sync> ProgressCallback for F {
    fn on_progress(&self, done: usize, total: usize) {
        self(done, total)
    }
}

/// Controls how a batch reacts to rows that fail structural decoding.
///
/// Unknown-signature rows are never affected: they are a first-class
/// outcome and always stay in the output with their raw bytes intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Drop rows that fail to decode. Suitable for best-effort analytics.
    #[default]
    Skip,
    /// Drop failed rows from the output but return their errors alongside.
    Collect,
    /// Abort the entire batch on the first failed row.
    Throw,
}

/// The output of a batch decode: events plus any collected errors.
#[derive(Debug)]
pub struct BatchOutcome {
    pub events: Vec<DecodedEvent>,
    /// `(row_index, error)` pairs — populated only in `Collect` mode.
    pub errors: Vec<(usize, DecodeError)>,
}

/// The central decoding contract.
pub trait LogDecoder: Send + Sync {
    /// The identifying hash a catalog lookup would use for this log.
    /// `None` for a log with no topics.
    fn selector(&self, log: &RawLog) -> Option<Selector> {
        selector_from_topics(&log.topics)
    }

    /// Decode a single raw log against the catalog. Every failure mode is
    /// a value: unknown selectors and malformed bytes come back as
    /// `DecodedEvent` statuses, never as panics or process errors.
    fn decode_log(&self, log: &RawLog, lookup: &dyn EventLookup) -> DecodedEvent;

    /// Decode a batch of raw logs.
    ///
    /// The default implementation is sequential; implementations can
    /// override it for parallelism (Rayon) when no progress callback is
    /// attached.
    fn decode_batch(
        &self,
        logs: &[RawLog],
        lookup: &dyn EventLookup,
        mode: ErrorMode,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<BatchOutcome, BatchError> {
        decode_batch_sequential(self, logs, lookup, mode, progress)
    }
}

/// Sequential batch decode — the default `decode_batch` body, shared with
/// implementations that fall back to it when progress tracking is on.
pub fn decode_batch_sequential<D: LogDecoder + ?Sized>(
    decoder: &D,
    logs: &[RawLog],
    lookup: &dyn EventLookup,
    mode: ErrorMode,
    progress: Option<&dyn ProgressCallback>,
) -> Result<BatchOutcome, BatchError> {
    let mut events = Vec::with_capacity(logs.len());
    let mut errors = Vec::new();

    for (idx, log) in logs.iter().enumerate() {
        let decoded = decoder.decode_log(log, lookup);
        match &decoded.status {
            DecodeStatus::Failed { error } => match mode {
                ErrorMode::Skip => {}
                ErrorMode::Collect => errors.push((idx, error.clone())),
                ErrorMode::Throw => {
                    return Err(BatchError::RowFailed {
                        index: idx,
                        source: error.clone(),
                    });
                }
            },
            _ => events.push(decoded),
        }

        if let Some(cb) = progress {
            cb.on_progress(idx + 1, logs.len());
        }
    }

    Ok(BatchOutcome { events, errors })
}
