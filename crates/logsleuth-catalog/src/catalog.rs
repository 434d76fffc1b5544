//! The in-memory event catalog.
//!
//! Keyed by selector, tolerating true collisions: a selector maps to a
//! *list* of candidate definitions in declaration order, and the decoder
//! attempts them in order. Duplicate entries with identical canonical
//! signatures (a proxy ABI merged with its implementation ABI, say)
//! collapse to a single definition — they decode identically by
//! construction.

use crate::abi::{parse_abi_json, AbiEntry};
use logsleuth_core::error::{CatalogError, TypeParseError};
use logsleuth_core::event::{EventDefinition, EventLookup, ParameterDefinition};
use logsleuth_core::signature::Selector;
use logsleuth_core::typespec::parse_type_spec;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A non-fatal observation recorded while building a catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildDiagnostic {
    /// An event entry whose types could not be resolved was skipped.
    SkippedEvent { name: String, error: TypeParseError },
    /// An anonymous event was catalogued for `decode_as` but cannot be
    /// matched by selector (no identifying hash occupies topics[0]).
    AnonymousEvent { name: String },
    /// Two entries with identical canonical signatures collapsed into one.
    DuplicateSignature { signature: String },
    /// Two entries with *different* signatures share a selector. Both are
    /// kept; decoding resolves by first-structurally-valid-wins.
    SelectorCollision {
        selector: Selector,
        signatures: Vec<String>,
    },
}

impl std::fmt::Display for BuildDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildDiagnostic::SkippedEvent { name, error } => {
                write!(f, "skipped event `{name}`: {error}")
            }
            BuildDiagnostic::AnonymousEvent { name } => {
                write!(f, "event `{name}` is anonymous and cannot be matched by selector")
            }
            BuildDiagnostic::DuplicateSignature { signature } => {
                write!(f, "duplicate definition for `{signature}` collapsed")
            }
            BuildDiagnostic::SelectorCollision { selector, signatures } => {
                write!(f, "selector {selector} is shared by: {}", signatures.join(", "))
            }
        }
    }
}

/// Selector → candidate definitions, built once per contract interface
/// and reused across many decode calls. Read-only after construction.
#[derive(Debug, Default, Clone)]
pub struct EventCatalog {
    by_selector: HashMap<Selector, Vec<Arc<EventDefinition>>>,
    /// All catalogued definitions in declaration order, anonymous included
    definitions: Vec<Arc<EventDefinition>>,
    /// Anonymous definitions, reachable only through `decode_as`
    anonymous: Vec<Arc<EventDefinition>>,
}

impl EventCatalog {
    /// Build a catalog from interface entries. Non-event entries are
    /// ignored; unresolvable events are skipped with a diagnostic rather
    /// than aborting the build.
    pub fn build<'a, I>(entries: I) -> (Self, Vec<BuildDiagnostic>)
    where
        I: IntoIterator<Item = &'a AbiEntry>,
    {
        let mut catalog = EventCatalog::default();
        let mut diagnostics = Vec::new();

        for entry in entries {
            if !entry.is_event() {
                continue;
            }
            match resolve_event(entry) {
                Ok(def) => catalog.insert(Arc::new(def), &mut diagnostics),
                Err(error) => {
                    debug!(event = %entry.name, %error, "skipping unresolvable event entry");
                    diagnostics.push(BuildDiagnostic::SkippedEvent {
                        name: entry.name.clone(),
                        error,
                    });
                }
            }
        }

        (catalog, diagnostics)
    }

    /// Build straight from an ABI JSON document.
    pub fn from_abi_json(json: &str) -> Result<(Self, Vec<BuildDiagnostic>), CatalogError> {
        let entries = parse_abi_json(json)?;
        Ok(Self::build(&entries))
    }

    /// Load one ABI JSON file.
    pub fn load_file(path: &Path) -> Result<(Self, Vec<BuildDiagnostic>), CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_abi_json(&json)
    }

    /// Load and merge several ABI JSON files into one catalog — the usual
    /// shape for a proxy contract plus its implementation.
    pub fn load_files<P: AsRef<Path>>(
        paths: &[P],
    ) -> Result<(Self, Vec<BuildDiagnostic>), CatalogError> {
        let mut entries = Vec::new();
        for path in paths {
            let json = std::fs::read_to_string(path.as_ref())?;
            entries.extend(parse_abi_json(&json)?);
        }
        Ok(Self::build(&entries))
    }

    fn insert(&mut self, def: Arc<EventDefinition>, diagnostics: &mut Vec<BuildDiagnostic>) {
        if def.anonymous {
            diagnostics.push(BuildDiagnostic::AnonymousEvent {
                name: def.name.clone(),
            });
            self.anonymous.push(def.clone());
            self.definitions.push(def);
            return;
        }

        let slot = self.by_selector.entry(def.selector).or_default();
        if slot.iter().any(|existing| existing.signature == def.signature) {
            diagnostics.push(BuildDiagnostic::DuplicateSignature {
                signature: def.signature.clone(),
            });
            return;
        }
        slot.push(def.clone());
        if slot.len() > 1 {
            diagnostics.push(BuildDiagnostic::SelectorCollision {
                selector: def.selector,
                signatures: slot.iter().map(|d| d.signature.clone()).collect(),
            });
        }
        self.definitions.push(def);
    }

    /// Candidate definitions for a selector: zero, one, or (on a true
    /// collision) many, in declaration order.
    pub fn lookup(&self, selector: &Selector) -> &[Arc<EventDefinition>] {
        self.by_selector
            .get(selector)
            .map(|defs| defs.as_slice())
            .unwrap_or(&[])
    }

    /// Every catalogued definition, in declaration order.
    pub fn definitions(&self) -> &[Arc<EventDefinition>] {
        &self.definitions
    }

    /// Anonymous definitions — decodable only via `decode_as`.
    pub fn anonymous_definitions(&self) -> &[Arc<EventDefinition>] {
        &self.anonymous
    }

    /// Number of catalogued definitions (anonymous included).
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl EventLookup for EventCatalog {
    fn candidates(&self, selector: &Selector) -> Vec<Arc<EventDefinition>> {
        self.lookup(selector).to_vec()
    }
}

/// Resolve one ABI event entry into a definition: parse every input type,
/// then derive the canonical signature and selector.
fn resolve_event(entry: &AbiEntry) -> Result<EventDefinition, TypeParseError> {
    let mut params = Vec::with_capacity(entry.inputs.len());
    for input in &entry.inputs {
        let descriptor = parse_type_spec(&input.type_spec, &input.components)?;
        params.push(ParameterDefinition {
            name: input.name.clone(),
            type_spec: input.type_spec.clone(),
            descriptor,
            indexed: input.indexed,
        });
    }
    Ok(EventDefinition::new(&entry.name, params, entry.anonymous))
}
