//! Elementary decoding of a single 32-byte word.
//!
//! Every rule here is strict: padding bytes must be exact, booleans must
//! be exactly 0 or 1, and integers must fit their declared width. A word
//! that merely "looks close" is a decode error, never a coerced value.

use alloy_primitives::{Address, I256, U256};
use logsleuth_core::error::DecodeError;
use logsleuth_core::hex::WORD;
use logsleuth_core::typespec::TypeDescriptor;
use logsleuth_core::value::DecodedValue;

/// Decode one elementary value from a 32-byte word.
///
/// `path` and `offset` locate the word for error attribution: the
/// parameter path and the absolute byte offset of the word within its
/// topic or data region.
pub fn decode_word(
    desc: &TypeDescriptor,
    word: &[u8; WORD],
    path: &str,
    offset: usize,
) -> Result<DecodedValue, DecodeError> {
    match desc {
        TypeDescriptor::Address => {
            if word[..12].iter().any(|&b| b != 0) {
                return Err(DecodeError::new(
                    "address word has non-zero high-order padding",
                    path,
                    offset,
                ));
            }
            Ok(DecodedValue::Address(Address::from_slice(&word[12..])))
        }

        TypeDescriptor::Bool => {
            if word[..31].iter().any(|&b| b != 0) || word[31] > 1 {
                return Err(DecodeError::new(
                    "boolean word is neither 0 nor 1",
                    path,
                    offset,
                ));
            }
            Ok(DecodedValue::Bool(word[31] == 1))
        }

        TypeDescriptor::Uint(bits) => {
            let width = *bits as usize / 8;
            if word[..WORD - width].iter().any(|&b| b != 0) {
                return Err(DecodeError::new(
                    format!("value overflows uint{bits}"),
                    path,
                    offset,
                ));
            }
            Ok(DecodedValue::Uint(U256::from_be_bytes(*word)))
        }

        TypeDescriptor::Int(bits) => {
            let width = *bits as usize / 8;
            // The canonical encoding of intN sign-extends to the full
            // word: every byte above the width must equal the fill byte.
            if width < WORD {
                let fill = if word[WORD - width] & 0x80 != 0 { 0xff } else { 0x00 };
                if word[..WORD - width].iter().any(|&b| b != fill) {
                    return Err(DecodeError::new(
                        format!("value overflows int{bits}"),
                        path,
                        offset,
                    ));
                }
            }
            Ok(DecodedValue::Int(I256::from_raw(U256::from_be_bytes(*word))))
        }

        TypeDescriptor::FixedBytes(n) => {
            let n = *n as usize;
            if word[n..].iter().any(|&b| b != 0) {
                return Err(DecodeError::new(
                    format!("bytes{n} word has non-zero trailing padding"),
                    path,
                    offset,
                ));
            }
            Ok(DecodedValue::FixedBytes(word[..n].to_vec().into()))
        }

        other => Err(DecodeError::new(
            format!("type {other} does not fit in a single word"),
            path,
            offset,
        )),
    }
}
