//! Head/tail encoding — the inverse of the region decoder.
//!
//! Used by the round-trip tests and by tooling that fabricates log data
//! (the bench fixture factory). Encoding is type-driven: every value must
//! match the shape of its descriptor exactly.

use alloy_primitives::U256;
use logsleuth_core::hex::WORD;
use logsleuth_core::typespec::TypeDescriptor;
use logsleuth_core::value::DecodedValue;
use thiserror::Error;

/// A value could not be encoded under the given descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("`{path}`: expected {expected}, got {got}")]
    TypeMismatch {
        path: String,
        expected: String,
        got: &'static str,
    },

    #[error("`{path}`: {reason}")]
    Invalid { path: String, reason: String },
}

/// Encode an ordered parameter list into a data region.
pub fn encode_region(
    items: &[(&TypeDescriptor, &DecodedValue)],
) -> Result<Vec<u8>, EncodeError> {
    let labeled: Vec<(String, &TypeDescriptor, &DecodedValue)> = items
        .iter()
        .enumerate()
        .map(|(i, (desc, val))| (i.to_string(), *desc, *val))
        .collect();
    encode_items(&labeled)
}

/// Encode one static elementary value into its 32-byte word.
pub fn encode_word(
    desc: &TypeDescriptor,
    val: &DecodedValue,
    path: &str,
) -> Result<[u8; WORD], EncodeError> {
    let mut word = [0u8; WORD];
    match (desc, val) {
        (TypeDescriptor::Address, DecodedValue::Address(a)) => {
            word[12..].copy_from_slice(a.as_slice());
        }
        (TypeDescriptor::Bool, DecodedValue::Bool(b)) => {
            word[31] = *b as u8;
        }
        (TypeDescriptor::Uint(bits), DecodedValue::Uint(u)) => {
            if *bits < 256 && (*u >> (*bits as usize)) != U256::ZERO {
                return Err(EncodeError::Invalid {
                    path: path.to_string(),
                    reason: format!("value overflows uint{bits}"),
                });
            }
            word = u.to_be_bytes::<WORD>();
        }
        (TypeDescriptor::Int(bits), DecodedValue::Int(i)) => {
            let raw = i.into_raw().to_be_bytes::<WORD>();
            let width = *bits as usize / 8;
            if width < WORD {
                let fill = if i.is_negative() { 0xff } else { 0x00 };
                let sign_ok = (raw[WORD - width] & 0x80 != 0) == i.is_negative();
                if !sign_ok || raw[..WORD - width].iter().any(|&b| b != fill) {
                    return Err(EncodeError::Invalid {
                        path: path.to_string(),
                        reason: format!("value overflows int{bits}"),
                    });
                }
            }
            word = raw;
        }
        (TypeDescriptor::FixedBytes(n), DecodedValue::FixedBytes(bytes)) => {
            let n = *n as usize;
            if bytes.len() != n {
                return Err(EncodeError::Invalid {
                    path: path.to_string(),
                    reason: format!("bytes{n} value has {} bytes", bytes.len()),
                });
            }
            word[..n].copy_from_slice(bytes);
        }
        (desc, val) => return Err(mismatch(path, desc, val)),
    }
    Ok(word)
}

fn encode_items(
    items: &[(String, &TypeDescriptor, &DecodedValue)],
) -> Result<Vec<u8>, EncodeError> {
    let head_size: usize = items.iter().map(|(_, desc, _)| desc.head_width()).sum();
    let mut head = Vec::with_capacity(head_size);
    let mut tail: Vec<u8> = Vec::new();

    for (path, desc, val) in items {
        if desc.is_dynamic() {
            let offset = head_size + tail.len();
            head.extend_from_slice(&U256::from(offset).to_be_bytes::<WORD>());
            tail.extend_from_slice(&encode_tail(desc, val, path)?);
        } else {
            head.extend_from_slice(&encode_static(desc, val, path)?);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

/// Encode a static value in place: elementary words, or the concatenated
/// parts of static arrays and tuples.
fn encode_static(
    desc: &TypeDescriptor,
    val: &DecodedValue,
    path: &str,
) -> Result<Vec<u8>, EncodeError> {
    match (desc, val) {
        (TypeDescriptor::Array { elem, len }, DecodedValue::List(items)) => {
            if items.len() != *len {
                return Err(EncodeError::Invalid {
                    path: path.to_string(),
                    reason: format!("fixed array expects {len} elements, got {}", items.len()),
                });
            }
            let mut out = Vec::with_capacity(len * elem.head_width());
            for (i, item) in items.iter().enumerate() {
                out.extend_from_slice(&encode_static(elem, item, &format!("{path}[{i}]"))?);
            }
            Ok(out)
        }
        (TypeDescriptor::Tuple(components), DecodedValue::Record(fields)) => {
            if fields.len() != components.len() {
                return Err(EncodeError::Invalid {
                    path: path.to_string(),
                    reason: format!(
                        "tuple expects {} components, got {}",
                        components.len(),
                        fields.len()
                    ),
                });
            }
            let mut out = Vec::new();
            for ((name, comp), (_, field)) in components.iter().zip(fields.iter()) {
                out.extend_from_slice(&encode_static(comp, field, &format!("{path}.{name}"))?);
            }
            Ok(out)
        }
        (TypeDescriptor::Array { .. } | TypeDescriptor::Tuple(_), _) => {
            Err(mismatch(path, desc, val))
        }
        _ => Ok(encode_word(desc, val, path)?.to_vec()),
    }
}

/// Encode a dynamic value's tail content.
fn encode_tail(
    desc: &TypeDescriptor,
    val: &DecodedValue,
    path: &str,
) -> Result<Vec<u8>, EncodeError> {
    match (desc, val) {
        (TypeDescriptor::Bytes, DecodedValue::Bytes(bytes)) => Ok(length_prefixed(bytes)),
        (TypeDescriptor::String, DecodedValue::Str(s)) => Ok(length_prefixed(s.as_bytes())),
        (TypeDescriptor::Vec(elem), DecodedValue::List(items)) => {
            let mut out = U256::from(items.len()).to_be_bytes::<WORD>().to_vec();
            out.extend_from_slice(&encode_elements(elem, items, path)?);
            Ok(out)
        }
        (TypeDescriptor::Array { elem, len }, DecodedValue::List(items)) => {
            if items.len() != *len {
                return Err(EncodeError::Invalid {
                    path: path.to_string(),
                    reason: format!("fixed array expects {len} elements, got {}", items.len()),
                });
            }
            encode_elements(elem, items, path)
        }
        (TypeDescriptor::Tuple(components), DecodedValue::Record(fields)) => {
            if fields.len() != components.len() {
                return Err(EncodeError::Invalid {
                    path: path.to_string(),
                    reason: format!(
                        "tuple expects {} components, got {}",
                        components.len(),
                        fields.len()
                    ),
                });
            }
            let labeled: Vec<(String, &TypeDescriptor, &DecodedValue)> = components
                .iter()
                .zip(fields.iter())
                .map(|((name, comp), (_, field))| (format!("{path}.{name}"), comp, field))
                .collect();
            encode_items(&labeled)
        }
        (desc, val) => Err(mismatch(path, desc, val)),
    }
}

fn encode_elements(
    elem: &TypeDescriptor,
    items: &[DecodedValue],
    path: &str,
) -> Result<Vec<u8>, EncodeError> {
    let labeled: Vec<(String, &TypeDescriptor, &DecodedValue)> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (format!("{path}[{i}]"), elem, item))
        .collect();
    encode_items(&labeled)
}

fn length_prefixed(content: &[u8]) -> Vec<u8> {
    let mut out = U256::from(content.len()).to_be_bytes::<WORD>().to_vec();
    out.extend_from_slice(content);
    let pad = (WORD - content.len() % WORD) % WORD;
    out.extend(std::iter::repeat(0u8).take(pad));
    out
}

fn mismatch(path: &str, desc: &TypeDescriptor, val: &DecodedValue) -> EncodeError {
    EncodeError::TypeMismatch {
        path: path.to_string(),
        expected: desc.to_string(),
        got: value_kind(val),
    }
}

fn value_kind(val: &DecodedValue) -> &'static str {
    match val {
        DecodedValue::Address(_) => "address",
        DecodedValue::Uint(_) => "uint",
        DecodedValue::Int(_) => "int",
        DecodedValue::Bool(_) => "bool",
        DecodedValue::FixedBytes(_) => "fixed bytes",
        DecodedValue::Bytes(_) => "bytes",
        DecodedValue::Str(_) => "string",
        DecodedValue::List(_) => "list",
        DecodedValue::Record(_) => "record",
        DecodedValue::Opaque32(_) => "opaque hash",
    }
}
