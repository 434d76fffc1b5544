//! `BatchEngine` — orchestrates chunked batch decoding.

use crate::request::BatchRequest;
use logsleuth_core::decoder::LogDecoder;
use logsleuth_core::error::{BatchError, DecodeError};
use logsleuth_core::event::{DecodeStatus, DecodedEvent, EventLookup};
use std::sync::Arc;
use tracing::info;

/// Result of a batch decode job.
#[derive(Debug)]
pub struct BatchReport {
    /// Decoded rows in input order (failed rows excluded; see `ErrorMode`)
    pub events: Vec<DecodedEvent>,
    /// `(input_index, error)` pairs — populated only in Collect mode
    pub errors: Vec<(usize, DecodeError)>,
    /// Total raw rows processed
    pub total_input: usize,
}

impl BatchReport {
    /// Rows that matched a definition and decoded fully.
    pub fn matched_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_matched()).count()
    }

    /// Rows whose selector had no catalog entry; preserved verbatim.
    pub fn unknown_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.status, DecodeStatus::UnknownSignature))
            .count()
    }
}

/// Chunked batch decode over a shared, immutable catalog.
pub struct BatchEngine {
    lookup: Arc<dyn EventLookup>,
    decoder: Arc<dyn LogDecoder>,
}

impl BatchEngine {
    pub fn new(lookup: Arc<dyn EventLookup>, decoder: Arc<dyn LogDecoder>) -> Self {
        Self { lookup, decoder }
    }

    /// Execute a batch decode request.
    pub fn decode(&self, request: BatchRequest) -> Result<BatchReport, BatchError> {
        let total_input = request.logs.len();
        info!(
            rows = total_input,
            chunk_size = request.chunk_size,
            "batch decode starting"
        );

        let mut events: Vec<DecodedEvent> = Vec::with_capacity(total_input);
        let mut errors: Vec<(usize, DecodeError)> = Vec::new();
        let mut global_offset = 0usize;

        for chunk in request.logs.chunks(request.chunk_size) {
            let outcome = self
                .decoder
                .decode_batch(chunk, self.lookup.as_ref(), request.error_mode, None)
                .map_err(|err| reindex(err, global_offset))?;

            events.extend(outcome.events);
            for (local_idx, error) in outcome.errors {
                errors.push((global_offset + local_idx, error));
            }
            global_offset += chunk.len();

            if let Some(cb) = &request.on_progress {
                cb(global_offset, total_input);
            }
        }

        let report = BatchReport {
            events,
            errors,
            total_input,
        };
        info!(
            matched = report.matched_count(),
            unknown = report.unknown_count(),
            failed = report.errors.len(),
            "batch decode complete"
        );
        Ok(report)
    }
}

/// Rebase a chunk-local row index onto the whole batch.
fn reindex(err: BatchError, offset: usize) -> BatchError {
    match err {
        BatchError::RowFailed { index, source } => BatchError::RowFailed {
            index: index + offset,
            source,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsleuth_core::decoder::ErrorMode;
    use logsleuth_core::event::{EventDefinition, RawLog};
    use logsleuth_core::signature::Selector;

    /// Decoder stub: even log_index rows are unknown, odd rows fail.
    struct StubDecoder;

    impl LogDecoder for StubDecoder {
        fn decode_log(
            &self,
            log: &RawLog,
            _lookup: &dyn EventLookup,
        ) -> DecodedEvent {
            if log.log_index.unwrap_or(0) % 2 == 0 {
                DecodedEvent::unknown(log.clone())
            } else {
                DecodedEvent::failed(
                    log.clone(),
                    None,
                    DecodeError::new("stub failure", "x", 0),
                )
            }
        }
    }

    struct EmptyLookup;

    impl EventLookup for EmptyLookup {
        fn candidates(&self, _selector: &Selector) -> Vec<Arc<EventDefinition>> {
            Vec::new()
        }
    }

    fn engine() -> BatchEngine {
        BatchEngine::new(Arc::new(EmptyLookup), Arc::new(StubDecoder))
    }

    fn rows(n: u32) -> Vec<RawLog> {
        (0..n)
            .map(|i| RawLog {
                log_index: Some(i),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn chunked_collect_keeps_global_indices() {
        let request = BatchRequest::new(rows(10))
            .chunk_size(3)
            .error_mode(ErrorMode::Collect);
        let report = engine().decode(request).unwrap();

        assert_eq!(report.total_input, 10);
        assert_eq!(report.events.len(), 5);
        assert_eq!(report.unknown_count(), 5);
        let indices: Vec<usize> = report.errors.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, [1, 3, 5, 7, 9]);
    }

    #[test]
    fn throw_mode_rebases_the_failing_index() {
        let request = BatchRequest::new(rows(10))
            .chunk_size(4)
            .error_mode(ErrorMode::Throw);
        let err = engine().decode(request).unwrap_err();
        assert!(matches!(err, BatchError::RowFailed { index: 1, .. }));
    }

    #[test]
    fn progress_reports_per_chunk() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc as StdArc;

        let seen = StdArc::new(AtomicUsize::new(0));
        let seen_in_cb = seen.clone();
        let request = BatchRequest::new(rows(10))
            .chunk_size(4)
            .on_progress(move |done, total| {
                assert_eq!(total, 10);
                seen_in_cb.store(done, Ordering::SeqCst);
            });
        engine().decode(request).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 10);
    }
}
