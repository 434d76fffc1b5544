//! Decode metrics definitions.
//!
//! All metrics use OpenTelemetry conventions and can be exported via any
//! installed meter provider (Prometheus, Grafana, Datadog, ...). With no
//! provider installed the handles are no-ops, so recording is always safe.

use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Central metrics handle for the decode pipeline.
#[derive(Clone)]
pub struct DecodeMetrics {
    pub logs_matched: Counter<u64>,
    pub unknown_signatures: Counter<u64>,
    pub decode_failures: Counter<u64>,
    pub decode_latency_ms: Histogram<f64>,
    pub batch_size: Histogram<u64>,
}

impl DecodeMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            logs_matched: meter
                .u64_counter("logsleuth.logs_matched")
                .with_description("Log rows that matched a definition and decoded fully")
                .build(),
            unknown_signatures: meter
                .u64_counter("logsleuth.unknown_signatures")
                .with_description("Log rows whose selector had no catalog entry")
                .build(),
            decode_failures: meter
                .u64_counter("logsleuth.decode_failures")
                .with_description("Log rows that failed structural decoding")
                .build(),
            decode_latency_ms: meter
                .f64_histogram("logsleuth.decode_latency_ms")
                .with_description("Time to decode a batch in milliseconds")
                .build(),
            batch_size: meter
                .u64_histogram("logsleuth.batch_size")
                .with_description("Number of rows in a batch decode request")
                .build(),
        }
    }

    /// Build against the globally installed meter provider.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("logsleuth"))
    }

    pub fn record_matched(&self, event_name: &str) {
        self.logs_matched
            .add(1, &[KeyValue::new("event", event_name.to_string())]);
    }

    pub fn record_unknown(&self) {
        self.unknown_signatures.add(1, &[]);
    }

    pub fn record_failure(&self, path: &str) {
        self.decode_failures
            .add(1, &[KeyValue::new("path", path.to_string())]);
    }

    pub fn record_batch(&self, rows: u64, elapsed_ms: f64) {
        self.batch_size.record(rows, &[]);
        self.decode_latency_ms.record(elapsed_ms, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_a_provider_is_a_noop() {
        let metrics = DecodeMetrics::global();
        metrics.record_matched("Transfer");
        metrics.record_unknown();
        metrics.record_failure("value");
        metrics.record_batch(100, 1.5);
    }
}
