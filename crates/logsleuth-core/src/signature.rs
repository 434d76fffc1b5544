//! Canonical event signatures and their identifying hashes.
//!
//! The selector of an event is the keccak-256 hash of its canonical
//! signature string, e.g.:
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef
//!
//! For raw logs, topics[0] IS the selector (unless the event is anonymous)
//! — it never needs to be recomputed from the log side.

use crate::typespec::TypeDescriptor;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;
use tiny_keccak::{Hasher, Keccak};

/// The 32-byte identifying hash of an event's canonical signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector(pub B256);

impl Selector {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }

    /// Parse from a `0x`-prefixed 64-digit hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        s.parse::<B256>().ok().map(Selector)
    }
}

impl From<B256> for Selector {
    fn from(hash: B256) -> Self {
        Selector(hash)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build the canonical signature string `Name(type1,type2,...)`.
///
/// Each type renders in its base form — tuples expanded recursively to
/// `(t1,t2,...)` with array suffixes appended verbatim. Parameter names
/// and the `indexed` qualifier never participate, so identical interface
/// shapes always yield identical signatures.
pub fn canonical_signature(name: &str, parameter_types: &[TypeDescriptor]) -> String {
    let types: Vec<String> = parameter_types.iter().map(|t| t.to_string()).collect();
    format!("{}({})", name, types.join(","))
}

/// keccak-256 of a canonical signature string.
pub fn keccak256_signature(signature: &str) -> Selector {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(signature.as_bytes());
    hasher.finalize(&mut output);
    Selector(B256::from(output))
}

/// Extract the selector from a raw log's topics (topics[0]).
/// Returns `None` for a log with no topics.
pub fn selector_from_topics(topics: &[B256]) -> Option<Selector> {
    topics.first().copied().map(Selector)
}
