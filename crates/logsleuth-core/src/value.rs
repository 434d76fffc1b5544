//! Decoded values.
//!
//! [`DecodedValue`] mirrors the shape of [`crate::typespec::TypeDescriptor`]:
//! every descriptor variant decodes into exactly one value variant.
//! Integers are backed by 256-bit types so the full EVM range is exact.

use alloy_primitives::{Address, Bytes, B256, I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded, typed event parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DecodedValue {
    Address(Address),
    Uint(U256),
    Int(I256),
    Bool(bool),
    /// bytes1 .. bytes32 — carries exactly the declared number of bytes
    FixedBytes(Bytes),
    Bytes(Bytes),
    Str(String),
    List(Vec<DecodedValue>),
    /// Tuple / struct fields in declaration order
    Record(Vec<(String, DecodedValue)>),
    /// An indexed parameter of dynamic type: the chain stores only the
    /// keccak-256 digest of the value, so the original is unrecoverable.
    Opaque32(B256),
}

impl DecodedValue {
    pub fn as_address(&self) -> Option<Address> {
        match self {
            DecodedValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            DecodedValue::Uint(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<I256> {
        match self {
            DecodedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns `true` for values that are only the hash of the original.
    pub fn is_opaque(&self) -> bool {
        matches!(self, DecodedValue::Opaque32(_))
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Address(a) => write!(f, "{a}"),
            DecodedValue::Uint(u) => write!(f, "{u}"),
            DecodedValue::Int(i) => write!(f, "{i}"),
            DecodedValue::Bool(b) => write!(f, "{b}"),
            DecodedValue::FixedBytes(b) | DecodedValue::Bytes(b) => write!(f, "{b}"),
            DecodedValue::Str(s) => write!(f, "{s}"),
            DecodedValue::List(items) => {
                let parts: Vec<_> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            DecodedValue::Record(fields) => {
                let parts: Vec<_> = fields.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            DecodedValue::Opaque32(h) => write!(f, "{h}"),
        }
    }
}
