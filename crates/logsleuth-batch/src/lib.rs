//! # logsleuth-batch
//!
//! Batch decode engine for historical backfills.
//!
//! ## Features
//! - Memory-bounded chunking (default 10,000 rows per chunk)
//! - CPU-parallel decoding through the decoder's own batch override
//! - Progress callbacks (for progress bars / ETAs)
//! - Three error modes: Skip, Collect, Throw
//!
//! Rows are independent and the catalog is immutable, so throughput
//! scales with cores; no ordering is guaranteed between rows beyond the
//! reported indices.

pub mod engine;
pub mod request;

pub use engine::{BatchEngine, BatchReport};
pub use request::BatchRequest;
