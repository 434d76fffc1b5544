//! Head/tail decoding of dynamic and composite types.
//!
//! A region (the log's data field, or a tuple/array's own sub-region when
//! nested) starts with a fixed-size head: one slot per parameter, sized by
//! `TypeDescriptor::head_width`. Static values sit inline in the head;
//! dynamic values leave a byte offset there, relative to the region start,
//! pointing into the tail where the content lives — length-prefixed for
//! variable-length types.
//!
//! Offsets and lengths are validated against the region before any read.
//! A violation produces a `DecodeError` carrying the parameter path and
//! byte offset, never a truncated partial value. Padding bytes after
//! variable-length content are decode-irrelevant and not inspected.

use crate::word::decode_word;
use alloy_primitives::U256;
use logsleuth_core::error::DecodeError;
use logsleuth_core::hex::{word_at, WORD};
use logsleuth_core::typespec::TypeDescriptor;
use logsleuth_core::value::DecodedValue;

/// Decode an ordered parameter list from a data region.
///
/// Returns one value per parameter, in order. The parameter names are
/// only used to build error paths.
pub fn decode_region(
    params: &[(&str, &TypeDescriptor)],
    data: &[u8],
) -> Result<Vec<DecodedValue>, DecodeError> {
    if params.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() % WORD != 0 {
        return Err(DecodeError::new(
            "data region length is not a multiple of the word size",
            "<data>",
            data.len(),
        ));
    }
    let mut values = Vec::with_capacity(params.len());
    let mut pos = 0usize;
    for (name, desc) in params {
        values.push(decode_at(desc, data, pos, 0, name)?);
        pos += desc.head_width();
    }
    Ok(values)
}

/// Decode one value whose head slot sits at `pos` within `region`.
/// `base` is the absolute offset of `region` within the original blob,
/// carried only for error attribution.
fn decode_at(
    desc: &TypeDescriptor,
    region: &[u8],
    pos: usize,
    base: usize,
    path: &str,
) -> Result<DecodedValue, DecodeError> {
    match desc {
        TypeDescriptor::Address
        | TypeDescriptor::Bool
        | TypeDescriptor::Uint(_)
        | TypeDescriptor::Int(_)
        | TypeDescriptor::FixedBytes(_) => {
            let word = word_or_err(region, pos, base, path)?;
            decode_word(desc, &word, path, base + pos)
        }

        TypeDescriptor::Bytes => {
            let (start, len) = content_bounds(region, pos, base, path)?;
            Ok(DecodedValue::Bytes(region[start..start + len].to_vec().into()))
        }

        TypeDescriptor::String => {
            let (start, len) = content_bounds(region, pos, base, path)?;
            let text = String::from_utf8(region[start..start + len].to_vec()).map_err(|_| {
                DecodeError::new("string content is not valid UTF-8", path, base + start)
            })?;
            Ok(DecodedValue::Str(text))
        }

        TypeDescriptor::Vec(elem) => {
            let tail = offset_at(region, pos, base, path)?;
            let word = word_or_err(region, tail, base, path)?;
            let count = usize_from_word(&word, "length", base + tail, path)?;
            let elems = tail + WORD;
            decode_sequence(elem, count, &region[elems..], base + elems, path)
        }

        TypeDescriptor::Array { elem, len } => {
            if elem.is_dynamic() {
                let tail = offset_at(region, pos, base, path)?;
                decode_sequence(elem, *len, &region[tail..], base + tail, path)
            } else {
                let width = elem.head_width();
                let mut items = Vec::with_capacity(*len);
                for i in 0..*len {
                    let child = format!("{path}[{i}]");
                    items.push(decode_at(elem, region, pos + i * width, base, &child)?);
                }
                Ok(DecodedValue::List(items))
            }
        }

        TypeDescriptor::Tuple(components) => {
            if desc.is_dynamic() {
                let tail = offset_at(region, pos, base, path)?;
                decode_components(components, &region[tail..], 0, base + tail, path)
            } else {
                decode_components(components, region, pos, base, path)
            }
        }
    }
}

/// Decode `count` consecutive elements from the start of `region`.
/// Offsets of dynamic elements are relative to this region.
fn decode_sequence(
    elem: &TypeDescriptor,
    count: usize,
    region: &[u8],
    base: usize,
    path: &str,
) -> Result<DecodedValue, DecodeError> {
    let width = elem.head_width();
    let needed = count.checked_mul(width).ok_or_else(|| {
        DecodeError::new("array length overflows the addressable range", path, base)
    })?;
    if needed > region.len() {
        return Err(DecodeError::new(
            format!("array of {count} elements implies a read past the end of the region"),
            path,
            base,
        ));
    }
    let mut items = Vec::with_capacity(count);
    for i in 0..count {
        let child = format!("{path}[{i}]");
        items.push(decode_at(elem, region, i * width, base, &child)?);
    }
    Ok(DecodedValue::List(items))
}

/// Decode tuple components laid out consecutively from `pos`.
fn decode_components(
    components: &[(String, TypeDescriptor)],
    region: &[u8],
    pos: usize,
    base: usize,
    path: &str,
) -> Result<DecodedValue, DecodeError> {
    let mut fields = Vec::with_capacity(components.len());
    let mut cursor = pos;
    for (i, (name, comp)) in components.iter().enumerate() {
        let label = if name.is_empty() { i.to_string() } else { name.clone() };
        let child = format!("{path}.{label}");
        let value = decode_at(comp, region, cursor, base, &child)?;
        cursor += comp.head_width();
        fields.push((label, value));
    }
    Ok(DecodedValue::Record(fields))
}

/// Resolve the head slot at `pos` as an offset into the tail, verifying it
/// stays inside the region.
fn offset_at(region: &[u8], pos: usize, base: usize, path: &str) -> Result<usize, DecodeError> {
    let word = word_or_err(region, pos, base, path)?;
    let offset = usize_from_word(&word, "offset", base + pos, path)?;
    if offset > region.len() {
        return Err(DecodeError::new(
            format!(
                "offset {offset} points outside the data region ({} bytes)",
                region.len()
            ),
            path,
            base + pos,
        ));
    }
    Ok(offset)
}

/// Resolve a variable-length value's content range: follow the offset,
/// read the length word, and bounds-check the content.
fn content_bounds(
    region: &[u8],
    pos: usize,
    base: usize,
    path: &str,
) -> Result<(usize, usize), DecodeError> {
    let tail = offset_at(region, pos, base, path)?;
    let word = word_or_err(region, tail, base, path)?;
    let len = usize_from_word(&word, "length", base + tail, path)?;
    let start = tail + WORD;
    let fits = start
        .checked_add(len)
        .map(|end| end <= region.len())
        .unwrap_or(false);
    if !fits {
        return Err(DecodeError::new(
            format!("length {len} implies a read past the end of the region"),
            path,
            base + tail,
        ));
    }
    Ok((start, len))
}

fn word_or_err(
    region: &[u8],
    pos: usize,
    base: usize,
    path: &str,
) -> Result<[u8; WORD], DecodeError> {
    word_at(region, pos).ok_or_else(|| {
        DecodeError::new("read past the end of the data region", path, base + pos)
    })
}

fn usize_from_word(
    word: &[u8; WORD],
    what: &str,
    abs: usize,
    path: &str,
) -> Result<usize, DecodeError> {
    let value = U256::from_be_bytes(*word);
    usize::try_from(value).map_err(|_| {
        DecodeError::new(format!("{what} word overflows the addressable range"), path, abs)
    })
}
