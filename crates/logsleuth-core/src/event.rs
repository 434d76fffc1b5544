//! Raw log rows, event definitions, and decoded events.

use crate::error::DecodeError;
use crate::signature::{canonical_signature, keccak256_signature, Selector};
use crate::typespec::TypeDescriptor;
use crate::value::DecodedValue;
use alloy_primitives::{Address, Bytes, B256};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A raw, undecoded log record as received from an RPC node or a batch
/// loader. This is the input to every decode call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Contract address that emitted the log
    pub address: Address,
    /// topics[0] is the event selector (unless the event is anonymous);
    /// additional topics hold the indexed parameters, one word each.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed parameters; possibly empty
    pub data: Bytes,
    /// Transaction hash, when the upstream extractor provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
    /// Block number, when provided
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Log index within the transaction, when provided
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u32>,
}

/// One declared event parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    /// The type string exactly as declared in the interface description
    pub type_spec: String,
    /// The resolved descriptor the decode engine dispatches on
    pub descriptor: TypeDescriptor,
    /// Whether the parameter occupies a topic slot instead of the data blob
    pub indexed: bool,
}

/// A resolved event definition: the unit the catalog stores and the
/// decoder matches raw logs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    /// Parameters as declared, preserving indexed/non-indexed interleaving
    pub params: Vec<ParameterDefinition>,
    /// Canonical signature string, e.g. `Transfer(address,address,uint256)`
    pub signature: String,
    /// keccak-256 of the canonical signature — the identifying hash
    pub selector: Selector,
    /// Anonymous events carry no selector in topics[0]
    pub anonymous: bool,
}

impl EventDefinition {
    /// Build a definition, deriving the canonical signature and selector
    /// from the name and parameter descriptors.
    pub fn new(name: impl Into<String>, params: Vec<ParameterDefinition>, anonymous: bool) -> Self {
        let name = name.into();
        let types: Vec<TypeDescriptor> = params.iter().map(|p| p.descriptor.clone()).collect();
        let signature = canonical_signature(&name, &types);
        let selector = keccak256_signature(&signature);
        Self {
            name,
            params,
            signature,
            selector,
            anonymous,
        }
    }

    /// The indexed parameters, in declaration order (topics[1..]).
    pub fn indexed_params(&self) -> Vec<&ParameterDefinition> {
        self.params.iter().filter(|p| p.indexed).collect()
    }

    /// The non-indexed parameters, in declaration order (the data blob).
    pub fn data_params(&self) -> Vec<&ParameterDefinition> {
        self.params.iter().filter(|p| !p.indexed).collect()
    }
}

/// The outcome of a single decode call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecodeStatus {
    /// The log matched a definition and every parameter decoded.
    Matched,
    /// No catalog entry matches topics[0]. Not an error: callers typically
    /// store the raw log for later reclassification.
    UnknownSignature,
    /// The log matched a definition but its bytes are malformed relative
    /// to the declared types.
    Failed { error: DecodeError },
}

/// A decoded event — the primary output of LogSleuth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedEvent {
    /// The matched definition; `None` for unknown signatures
    pub event: Option<Arc<EventDefinition>>,
    /// Decoded values keyed by parameter name, in declaration order
    pub fields: IndexMap<String, DecodedValue>,
    /// The originating raw log, preserved verbatim
    pub log: RawLog,
    pub status: DecodeStatus,
    /// Set when more than one catalog entry shared the selector and the
    /// result came from the first structurally valid candidate.
    #[serde(default)]
    pub ambiguous: bool,
}

impl DecodedEvent {
    /// An unknown-signature outcome; topics and data stay untouched.
    pub fn unknown(log: RawLog) -> Self {
        Self {
            event: None,
            fields: IndexMap::new(),
            log,
            status: DecodeStatus::UnknownSignature,
            ambiguous: false,
        }
    }

    /// A structural decode failure for a matched definition.
    pub fn failed(log: RawLog, event: Option<Arc<EventDefinition>>, error: DecodeError) -> Self {
        Self {
            event,
            fields: IndexMap::new(),
            log,
            status: DecodeStatus::Failed { error },
            ambiguous: false,
        }
    }

    pub fn field(&self, name: &str) -> Option<&DecodedValue> {
        self.fields.get(name)
    }

    pub fn is_matched(&self) -> bool {
        matches!(self.status, DecodeStatus::Matched)
    }

    /// The matched event name, if any.
    pub fn event_name(&self) -> Option<&str> {
        self.event.as_deref().map(|e| e.name.as_str())
    }
}

/// Read-only lookup from selector to candidate definitions.
///
/// The catalog implements this; the decoder takes it as an explicit
/// capability so tests can substitute their own (including colliding)
/// candidate sets. Implementations must be shareable across threads —
/// a built catalog is read-only and decode calls are side-effect free.
pub trait EventLookup: Send + Sync {
    /// All definitions whose identifying hash equals `selector`, in
    /// declaration order. Usually zero or one; more on a true collision.
    fn candidates(&self, selector: &Selector) -> Vec<Arc<EventDefinition>>;
}
