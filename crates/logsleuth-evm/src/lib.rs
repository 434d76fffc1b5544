//! # logsleuth-evm
//!
//! The ABI decode engine: elementary word rules, the head/tail region
//! decoder for dynamic and composite types, the inverse encoder, and
//! `EvmLogDecoder` — the `LogDecoder` implementation that matches raw
//! logs against an event catalog.
//!
//! ## Implementation notes
//! - topics[0] → event selector (keccak-256 of the canonical signature)
//! - topics[1..] → indexed parameters, one 32-byte word each; dynamic
//!   indexed parameters are stored hashed and decode to `Opaque32`
//! - `data` → non-indexed parameters, decoded as one ABI-encoded tuple

pub mod decoder;
pub mod encoder;
pub mod region;
pub mod word;

pub use decoder::EvmLogDecoder;
pub use encoder::{encode_region, EncodeError};
pub use region::decode_region;
pub use word::decode_word;
