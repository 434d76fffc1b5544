//! # logsleuth-observability
//!
//! Observability helpers for LogSleuth.
//!
//! ## Built-in metrics
//! - `logsleuth.logs_matched`       — counter, tagged with event name
//! - `logsleuth.unknown_signatures` — counter
//! - `logsleuth.decode_failures`    — counter, tagged with reason
//! - `logsleuth.decode_latency_ms`  — histogram
//! - `logsleuth.batch_size`         — histogram
//!
//! ## Structured logging
//! Env-filtered `tracing` setup with optional JSON output, compatible
//! with ELK, Loki, CloudWatch. Log levels configurable per component.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::DecodeMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
