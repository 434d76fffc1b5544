//! Error types for the LogSleuth decode pipeline.
//!
//! Every failure here is a value returned to the caller — a batch of logs
//! must keep processing past any single malformed or unrecognized row.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A type string in an interface description could not be resolved.
/// Raised at catalog-build time and localized to the offending event
/// definition; it never aborts building the rest of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TypeParseError {
    #[error("unsupported type `{0}`")]
    UnsupportedType(String),

    #[error("invalid integer width {width} in `{spec}`")]
    InvalidIntWidth { spec: String, width: u64 },

    #[error("invalid bytes width {width} in `{spec}`")]
    InvalidBytesWidth { spec: String, width: u64 },

    #[error("unmatched bracket in `{0}`")]
    UnmatchedBracket(String),

    #[error("invalid array length in `{0}`")]
    InvalidArrayLength(String),

    #[error("tuple type `{0}` is missing its component list")]
    MissingComponents(String),
}

/// Bytes were malformed relative to the declared type: bad padding, an
/// out-of-range offset or length, a boolean word that is neither 0 nor 1,
/// an overflowing integer, or a wrong indexed-parameter count.
///
/// Always attributable to a specific parameter: `path` is the dotted
/// parameter path (e.g. `orders[2].amount`) and `offset` the byte position
/// within the topic word or data region where decoding failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("`{path}` at byte {offset}: {reason}")]
pub struct DecodeError {
    pub reason: String,
    pub path: String,
    pub offset: usize,
}

impl DecodeError {
    pub fn new(reason: impl Into<String>, path: impl Into<String>, offset: usize) -> Self {
        Self {
            reason: reason.into(),
            path: path.into(),
            offset,
        }
    }
}

/// Errors loading or parsing an interface description.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid ABI JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a batch decode run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("decode failed for row {index}: {source}")]
    RowFailed {
        index: usize,
        #[source]
        source: DecodeError,
    },

    #[error("{0}")]
    Other(String),
}
