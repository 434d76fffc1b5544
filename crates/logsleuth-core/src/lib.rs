//! # logsleuth-core
//!
//! Core types and traits shared across all LogSleuth crates: the type
//! descriptor tree, decoded values, event definitions, the error taxonomy,
//! and the `LogDecoder` / `EventLookup` contracts the decode engine and
//! catalog are built on.

pub mod decoder;
pub mod error;
pub mod event;
pub mod hex;
pub mod signature;
pub mod typespec;
pub mod value;

pub use decoder::{BatchOutcome, ErrorMode, LogDecoder, ProgressCallback};
pub use error::{BatchError, CatalogError, DecodeError, TypeParseError};
pub use event::{DecodeStatus, DecodedEvent, EventDefinition, EventLookup, ParameterDefinition, RawLog};
pub use signature::{canonical_signature, keccak256_signature, selector_from_topics, Selector};
pub use typespec::{parse_type_spec, TypeComponent, TypeDescriptor};
pub use value::DecodedValue;
