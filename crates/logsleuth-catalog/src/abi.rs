//! Serde model of a standard Ethereum ABI JSON document.
//!
//! Only `"type": "event"` entries matter to the catalog; functions,
//! errors, constructors and the rest parse but are ignored downstream.

use logsleuth_core::error::CatalogError;
use logsleuth_core::typespec::TypeComponent;
use serde::{Deserialize, Serialize};

/// One entry of an interface description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbiEntry {
    /// Entry kind: "event", "function", "error", "constructor", ...
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub inputs: Vec<AbiInput>,
}

impl AbiEntry {
    pub fn is_event(&self) -> bool {
        self.kind == "event"
    }
}

/// One declared input of an ABI entry. `components` is present only for
/// tuple-typed inputs; `indexed` is only meaningful on event inputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbiInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_spec: String,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub components: Vec<TypeComponent>,
}

/// Parse an ABI JSON document into entries.
///
/// Accepts both the bare-array form (`[...]`, what explorers return) and
/// the wrapped form (`{"abi": [...]}`, what compiler artifacts carry).
pub fn parse_abi_json(json: &str) -> Result<Vec<AbiEntry>, CatalogError> {
    #[derive(Deserialize)]
    struct Wrapped {
        abi: Vec<AbiEntry>,
    }

    match serde_json::from_str::<Vec<AbiEntry>>(json) {
        Ok(entries) => Ok(entries),
        Err(first_err) => match serde_json::from_str::<Wrapped>(json) {
            Ok(wrapped) => Ok(wrapped.abi),
            Err(_) => Err(CatalogError::Json(first_err)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_ABI: &str = r#"[
        {
            "type": "event",
            "name": "Transfer",
            "anonymous": false,
            "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256", "indexed": false}
            ]
        },
        {
            "type": "function",
            "name": "transfer",
            "inputs": [
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ]
        }
    ]"#;

    #[test]
    fn parses_bare_array() {
        let entries = parse_abi_json(ERC20_ABI).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_event());
        assert!(!entries[1].is_event());
        assert_eq!(entries[0].inputs[2].name, "value");
        assert!(entries[0].inputs[0].indexed);
    }

    #[test]
    fn parses_wrapped_artifact() {
        let wrapped = format!(r#"{{"contractName": "Token", "abi": {ERC20_ABI}}}"#);
        let entries = parse_abi_json(&wrapped).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn parses_tuple_components() {
        let json = r#"[{
            "type": "event",
            "name": "OrderPlaced",
            "inputs": [{
                "name": "orders",
                "type": "tuple[]",
                "indexed": false,
                "components": [
                    {"name": "maker", "type": "address"},
                    {"name": "amount", "type": "uint256"}
                ]
            }]
        }]"#;
        let entries = parse_abi_json(json).unwrap();
        assert_eq!(entries[0].inputs[0].components.len(), 2);
        assert_eq!(entries[0].inputs[0].components[1].type_spec, "uint256");
    }

    #[test]
    fn garbage_rejected() {
        assert!(parse_abi_json("not json").is_err());
        assert!(parse_abi_json(r#"{"no_abi_key": 1}"#).is_err());
    }
}
