//! Type descriptors and the type-string parser.
//!
//! An interface description declares parameter types as strings
//! (`uint256`, `address[]`, `(address,uint96)[3]`). [`parse_type_spec`]
//! resolves those into a [`TypeDescriptor`] tree once, at catalog-build
//! time; the decode engine then dispatches on the tree and never looks at
//! strings again.

use crate::error::TypeParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The resolved shape of one event parameter.
///
/// Integer and bytes widths are validated at construction: bit widths must
/// be multiples of 8 in `8..=256`, fixed bytes lengths in `1..=32`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeDescriptor {
    /// 20-byte account address, right-aligned in its word
    Address,
    /// Boolean — encoded as a full word equal to exactly 0 or 1
    Bool,
    /// Unsigned integer. Width in bits.
    Uint(u16),
    /// Signed (two's complement) integer. Width in bits.
    Int(u16),
    /// Fixed-size byte array (bytes1 .. bytes32), left-aligned. Length in bytes.
    FixedBytes(u8),
    /// Variable-length byte array
    Bytes,
    /// UTF-8 string
    String,
    /// Fixed-length array of a type
    Array { elem: Box<TypeDescriptor>, len: usize },
    /// Variable-length array of a type
    Vec(Box<TypeDescriptor>),
    /// Tuple / struct with ordered, named components
    Tuple(Vec<(String, TypeDescriptor)>),
}

impl TypeDescriptor {
    /// Whether values of this type live in the tail region (their head
    /// slot holds an offset instead of the value itself).
    pub fn is_dynamic(&self) -> bool {
        match self {
            TypeDescriptor::Bytes | TypeDescriptor::String | TypeDescriptor::Vec(_) => true,
            TypeDescriptor::Array { elem, .. } => elem.is_dynamic(),
            TypeDescriptor::Tuple(components) => components.iter().any(|(_, c)| c.is_dynamic()),
            _ => false,
        }
    }

    /// Number of bytes this type occupies in the head region of an
    /// encoding: one word for every elementary or dynamic type, the sum of
    /// the parts for static composites.
    pub fn head_width(&self) -> usize {
        if self.is_dynamic() {
            return crate::hex::WORD;
        }
        match self {
            TypeDescriptor::Array { elem, len } => len * elem.head_width(),
            TypeDescriptor::Tuple(components) => {
                components.iter().map(|(_, c)| c.head_width()).sum()
            }
            _ => crate::hex::WORD,
        }
    }
}

/// Renders the canonical base form of a type — exactly the spelling that
/// participates in an event's signature string. Tuples expand to
/// `(t1,t2,...)`; parameter names never appear.
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Address => write!(f, "address"),
            TypeDescriptor::Bool => write!(f, "bool"),
            TypeDescriptor::Uint(bits) => write!(f, "uint{bits}"),
            TypeDescriptor::Int(bits) => write!(f, "int{bits}"),
            TypeDescriptor::FixedBytes(n) => write!(f, "bytes{n}"),
            TypeDescriptor::Bytes => write!(f, "bytes"),
            TypeDescriptor::String => write!(f, "string"),
            TypeDescriptor::Array { elem, len } => write!(f, "{elem}[{len}]"),
            TypeDescriptor::Vec(elem) => write!(f, "{elem}[]"),
            TypeDescriptor::Tuple(components) => {
                write!(f, "(")?;
                for (i, (_, c)) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// One entry of the ordered component list accompanying a tuple type in an
/// interface description. Components nest for tuples-of-tuples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeComponent {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_spec: String,
    #[serde(default)]
    pub components: Vec<TypeComponent>,
}

impl TypeComponent {
    pub fn new(name: impl Into<String>, type_spec: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_spec: type_spec.into(),
            components: Vec::new(),
        }
    }
}

/// Parse a type string into a [`TypeDescriptor`].
///
/// Array suffixes bind right-to-left: `uint256[2][]` is a dynamic array of
/// fixed two-element arrays of `uint256`. Tuple types (`tuple`, or the
/// inline `(a,b)` spelling some toolchains emit) require the accompanying
/// ordered `components` list.
pub fn parse_type_spec(
    spec: &str,
    components: &[TypeComponent],
) -> Result<TypeDescriptor, TypeParseError> {
    let spec = spec.trim();

    // Some compiler outputs spell address parameters as `contract Foo`.
    if spec.starts_with("contract ") {
        return Ok(TypeDescriptor::Address);
    }

    // The outermost type corresponds to the last array suffix.
    if let Some(stripped) = spec.strip_suffix(']') {
        let open = stripped
            .rfind('[')
            .ok_or_else(|| TypeParseError::UnmatchedBracket(spec.to_string()))?;
        let elem = parse_type_spec(&stripped[..open], components)?;
        let len_str = &stripped[open + 1..];
        if len_str.is_empty() {
            return Ok(TypeDescriptor::Vec(Box::new(elem)));
        }
        let len: usize = len_str
            .parse()
            .map_err(|_| TypeParseError::InvalidArrayLength(spec.to_string()))?;
        if len == 0 {
            return Err(TypeParseError::InvalidArrayLength(spec.to_string()));
        }
        return Ok(TypeDescriptor::Array {
            elem: Box::new(elem),
            len,
        });
    }
    if spec.contains('[') {
        return Err(TypeParseError::UnmatchedBracket(spec.to_string()));
    }

    match spec {
        "address" => return Ok(TypeDescriptor::Address),
        "bool" => return Ok(TypeDescriptor::Bool),
        "string" => return Ok(TypeDescriptor::String),
        "bytes" => return Ok(TypeDescriptor::Bytes),
        // Bare aliases normalize to their full-width forms.
        "uint" => return Ok(TypeDescriptor::Uint(256)),
        "int" => return Ok(TypeDescriptor::Int(256)),
        "tuple" => return parse_tuple(spec, components),
        _ => {}
    }

    if spec.starts_with('(') {
        return parse_tuple(spec, components);
    }

    if let Some(width) = spec.strip_prefix("uint") {
        let bits = parse_width(spec, width)?;
        return Ok(TypeDescriptor::Uint(bits as u16));
    }
    if let Some(width) = spec.strip_prefix("int") {
        let bits = parse_width(spec, width)?;
        return Ok(TypeDescriptor::Int(bits as u16));
    }
    if let Some(width) = spec.strip_prefix("bytes") {
        let n: u64 = width
            .parse()
            .map_err(|_| TypeParseError::UnsupportedType(spec.to_string()))?;
        if n == 0 || n > 32 {
            return Err(TypeParseError::InvalidBytesWidth {
                spec: spec.to_string(),
                width: n,
            });
        }
        return Ok(TypeDescriptor::FixedBytes(n as u8));
    }

    Err(TypeParseError::UnsupportedType(spec.to_string()))
}

fn parse_width(spec: &str, digits: &str) -> Result<u64, TypeParseError> {
    let bits: u64 = digits
        .parse()
        .map_err(|_| TypeParseError::UnsupportedType(spec.to_string()))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(TypeParseError::InvalidIntWidth {
            spec: spec.to_string(),
            width: bits,
        });
    }
    Ok(bits)
}

fn parse_tuple(
    spec: &str,
    components: &[TypeComponent],
) -> Result<TypeDescriptor, TypeParseError> {
    if components.is_empty() {
        return Err(TypeParseError::MissingComponents(spec.to_string()));
    }
    let mut resolved = Vec::with_capacity(components.len());
    for component in components {
        let descriptor = parse_type_spec(&component.type_spec, &component.components)?;
        resolved.push((component.name.clone(), descriptor));
    }
    Ok(TypeDescriptor::Tuple(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(spec: &str) -> TypeDescriptor {
        parse_type_spec(spec, &[]).unwrap()
    }

    #[test]
    fn elementary_types() {
        assert_eq!(parse("address"), TypeDescriptor::Address);
        assert_eq!(parse("bool"), TypeDescriptor::Bool);
        assert_eq!(parse("uint256"), TypeDescriptor::Uint(256));
        assert_eq!(parse("int24"), TypeDescriptor::Int(24));
        assert_eq!(parse("bytes32"), TypeDescriptor::FixedBytes(32));
        assert_eq!(parse("bytes"), TypeDescriptor::Bytes);
        assert_eq!(parse("string"), TypeDescriptor::String);
    }

    #[test]
    fn bare_aliases_normalize() {
        assert_eq!(parse("uint"), TypeDescriptor::Uint(256));
        assert_eq!(parse("int"), TypeDescriptor::Int(256));
    }

    #[test]
    fn contract_types_are_addresses() {
        assert_eq!(parse("contract IERC20"), TypeDescriptor::Address);
    }

    #[test]
    fn array_suffixes_bind_right_to_left() {
        // uint256[2][] = dynamic array of fixed arrays of length 2
        let parsed = parse("uint256[2][]");
        match parsed {
            TypeDescriptor::Vec(elem) => {
                assert_eq!(
                    *elem,
                    TypeDescriptor::Array {
                        elem: Box::new(TypeDescriptor::Uint(256)),
                        len: 2
                    }
                );
            }
            other => panic!("expected Vec, got {other:?}"),
        }
    }

    #[test]
    fn tuple_requires_components() {
        let err = parse_type_spec("tuple", &[]).unwrap_err();
        assert!(matches!(err, TypeParseError::MissingComponents(_)));
    }

    #[test]
    fn tuple_with_components() {
        let components = vec![
            TypeComponent::new("maker", "address"),
            TypeComponent::new("amount", "uint96"),
        ];
        let parsed = parse_type_spec("tuple[3]", &components).unwrap();
        assert_eq!(parsed.to_string(), "(address,uint96)[3]");
        assert!(!parsed.is_dynamic());
    }

    #[test]
    fn invalid_widths_rejected() {
        assert!(matches!(
            parse_type_spec("uint0", &[]),
            Err(TypeParseError::InvalidIntWidth { .. })
        ));
        assert!(matches!(
            parse_type_spec("uint12", &[]),
            Err(TypeParseError::InvalidIntWidth { .. })
        ));
        assert!(matches!(
            parse_type_spec("uint512", &[]),
            Err(TypeParseError::InvalidIntWidth { .. })
        ));
        assert!(matches!(
            parse_type_spec("bytes33", &[]),
            Err(TypeParseError::InvalidBytesWidth { .. })
        ));
        assert!(matches!(
            parse_type_spec("bytes0", &[]),
            Err(TypeParseError::InvalidBytesWidth { .. })
        ));
    }

    #[test]
    fn malformed_specs_rejected() {
        assert!(matches!(
            parse_type_spec("uint256[", &[]),
            Err(TypeParseError::UnmatchedBracket(_))
        ));
        assert!(matches!(
            parse_type_spec("uint256[x]", &[]),
            Err(TypeParseError::InvalidArrayLength(_))
        ));
        assert!(matches!(
            parse_type_spec("uint256[0]", &[]),
            Err(TypeParseError::InvalidArrayLength(_))
        ));
        assert!(matches!(
            parse_type_spec("fixed128x18", &[]),
            Err(TypeParseError::UnsupportedType(_))
        ));
    }

    #[test]
    fn dynamic_detection() {
        assert!(parse("string").is_dynamic());
        assert!(parse("bytes").is_dynamic());
        assert!(parse("uint8[]").is_dynamic());
        assert!(parse("uint8[4][]").is_dynamic());
        assert!(!parse("uint8[4]").is_dynamic());
        assert!(parse("string[2]").is_dynamic());

        let components = vec![
            TypeComponent::new("id", "uint256"),
            TypeComponent::new("note", "string"),
        ];
        assert!(parse_type_spec("tuple", &components).unwrap().is_dynamic());
    }

    #[test]
    fn head_widths() {
        assert_eq!(parse("uint256").head_width(), 32);
        assert_eq!(parse("uint8[4]").head_width(), 128);
        // dynamic types occupy one offset word in the head
        assert_eq!(parse("uint8[]").head_width(), 32);
        assert_eq!(parse("string[2]").head_width(), 32);

        let components = vec![
            TypeComponent::new("a", "uint256"),
            TypeComponent::new("b", "address"),
        ];
        assert_eq!(parse_type_spec("tuple", &components).unwrap().head_width(), 64);
    }

    #[test]
    fn canonical_display() {
        assert_eq!(parse("uint256[2][]").to_string(), "uint256[2][]");
        let components = vec![
            TypeComponent::new("maker", "address"),
            TypeComponent::new("amount", "uint256"),
        ];
        assert_eq!(
            parse_type_spec("tuple[]", &components).unwrap().to_string(),
            "(address,uint256)[]"
        );
    }
}
