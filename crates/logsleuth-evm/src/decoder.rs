//! `EvmLogDecoder` — the `LogDecoder` implementation for EVM event logs.
//!
//! # Indexed-parameter encoding rules
//! - **Value types** (uint, int, bool, address, bytes1–bytes32) are padded
//!   to 32 bytes and stored directly in their topic slot — recoverable.
//! - **Reference types** (string, bytes, arrays, tuples) are stored as the
//!   keccak-256 of their encoded form — the original value is
//!   unrecoverable, so they decode to an explicit `Opaque32` instead of a
//!   structural decode that would silently fail.

use crate::region::decode_region;
use crate::word::decode_word;
use alloy_primitives::B256;
use indexmap::IndexMap;
use logsleuth_core::decoder::{
    decode_batch_sequential, BatchOutcome, ErrorMode, LogDecoder, ProgressCallback,
};
use logsleuth_core::error::{BatchError, DecodeError};
use logsleuth_core::event::{
    DecodeStatus, DecodedEvent, EventDefinition, EventLookup, RawLog,
};
use logsleuth_core::typespec::TypeDescriptor;
use logsleuth_core::value::DecodedValue;
use rayon::prelude::*;
use std::sync::Arc;

/// The EVM log decoder. Thread-safe and cheap to clone (no heap state).
#[derive(Debug, Default, Clone)]
pub struct EvmLogDecoder;

impl EvmLogDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a log against one explicitly chosen definition, bypassing
    /// catalog lookup. This is the only way to decode anonymous events,
    /// which carry no selector in topics[0].
    pub fn decode_as(&self, log: &RawLog, def: &Arc<EventDefinition>) -> DecodedEvent {
        match self.decode_fields(log, def) {
            Ok(fields) => DecodedEvent {
                event: Some(def.clone()),
                fields,
                log: log.clone(),
                status: DecodeStatus::Matched,
                ambiguous: false,
            },
            Err(error) => DecodedEvent::failed(log.clone(), Some(def.clone()), error),
        }
    }

    /// Decode every parameter of `def` from the log, in declaration order.
    fn decode_fields(
        &self,
        log: &RawLog,
        def: &EventDefinition,
    ) -> Result<IndexMap<String, DecodedValue>, DecodeError> {
        // Indexed parameters match positionally against the topic slots
        // after the selector (all slots, for anonymous events).
        let first_topic = if def.anonymous { 0 } else { 1 };
        let carried = log.topics.len().saturating_sub(first_topic);
        let declared = def.params.iter().filter(|p| p.indexed).count();
        if carried != declared {
            return Err(DecodeError::new(
                format!(
                    "indexed parameter count mismatch: event declares {declared}, log carries {carried}"
                ),
                "<topics>",
                0,
            ));
        }

        let data_params: Vec<(&str, &TypeDescriptor)> = def
            .data_params()
            .iter()
            .map(|p| (p.name.as_str(), &p.descriptor))
            .collect();
        let data_values = decode_region(&data_params, &log.data)?;
        let mut data_values = data_values.into_iter();

        let mut fields = IndexMap::with_capacity(def.params.len());
        let mut topic_idx = first_topic;
        for (i, param) in def.params.iter().enumerate() {
            let key = if param.name.is_empty() {
                i.to_string()
            } else {
                param.name.clone()
            };
            if param.indexed {
                let value = decode_topic(&param.descriptor, &log.topics[topic_idx], &key)?;
                topic_idx += 1;
                fields.insert(key, value);
            } else if let Some(value) = data_values.next() {
                fields.insert(key, value);
            }
        }
        Ok(fields)
    }
}

/// Decode a single indexed topic word.
fn decode_topic(
    desc: &TypeDescriptor,
    topic: &B256,
    path: &str,
) -> Result<DecodedValue, DecodeError> {
    match desc {
        // Reference types are hashed in indexed position; only the digest
        // survives on chain.
        TypeDescriptor::Bytes
        | TypeDescriptor::String
        | TypeDescriptor::Vec(_)
        | TypeDescriptor::Array { .. }
        | TypeDescriptor::Tuple(_) => Ok(DecodedValue::Opaque32(*topic)),
        _ => decode_word(desc, &topic.0, path, 0),
    }
}

impl LogDecoder for EvmLogDecoder {
    fn decode_log(&self, log: &RawLog, lookup: &dyn EventLookup) -> DecodedEvent {
        let Some(selector) = self.selector(log) else {
            // No topics at all: nothing to match against.
            return DecodedEvent::unknown(log.clone());
        };

        let candidates = lookup.candidates(&selector);
        if candidates.is_empty() {
            return DecodedEvent::unknown(log.clone());
        }

        // On a true selector collision every candidate is attempted in
        // declaration order and the first structurally valid one wins.
        let ambiguous = candidates.len() > 1;
        let mut failures: Vec<(String, DecodeError)> = Vec::new();
        for def in &candidates {
            match self.decode_fields(log, def) {
                Ok(fields) => {
                    return DecodedEvent {
                        event: Some(def.clone()),
                        fields,
                        log: log.clone(),
                        status: DecodeStatus::Matched,
                        ambiguous,
                    };
                }
                Err(error) => failures.push((def.signature.clone(), error)),
            }
        }

        let error = if let [(_, only)] = failures.as_slice() {
            only.clone()
        } else {
            let reasons: Vec<String> = failures
                .iter()
                .map(|(sig, err)| format!("{sig}: {err}"))
                .collect();
            DecodeError::new(
                format!("all {} candidates failed: {}", failures.len(), reasons.join("; ")),
                "<candidates>",
                0,
            )
        };
        let mut failed = DecodedEvent::failed(log.clone(), candidates.first().cloned(), error);
        failed.ambiguous = ambiguous;
        failed
    }

    /// Rayon-parallel batch decode. Rows are independent — the catalog is
    /// read-only — so this is a plain parallel map with no ordering
    /// guarantee beyond the output index.
    fn decode_batch(
        &self,
        logs: &[RawLog],
        lookup: &dyn EventLookup,
        mode: ErrorMode,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<BatchOutcome, BatchError> {
        // Rayon workers can't share the progress callback cleanly; keep
        // the sequential path when one is attached.
        if progress.is_some() {
            return decode_batch_sequential(self, logs, lookup, mode, progress);
        }

        let decoded: Vec<DecodedEvent> = logs
            .par_iter()
            .map(|log| self.decode_log(log, lookup))
            .collect();

        let mut events = Vec::with_capacity(logs.len());
        let mut errors = Vec::new();
        for (idx, event) in decoded.into_iter().enumerate() {
            match &event.status {
                DecodeStatus::Failed { error } => match mode {
                    ErrorMode::Skip => {}
                    ErrorMode::Collect => errors.push((idx, error.clone())),
                    ErrorMode::Throw => {
                        return Err(BatchError::RowFailed {
                            index: idx,
                            source: error.clone(),
                        });
                    }
                },
                _ => events.push(event),
            }
        }
        Ok(BatchOutcome { events, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use logsleuth_core::event::ParameterDefinition;
    use logsleuth_core::signature::Selector;

    fn param(name: &str, spec: &str, descriptor: TypeDescriptor, indexed: bool) -> ParameterDefinition {
        ParameterDefinition {
            name: name.into(),
            type_spec: spec.into(),
            descriptor,
            indexed,
        }
    }

    fn transfer_def() -> Arc<EventDefinition> {
        Arc::new(EventDefinition::new(
            "Transfer",
            vec![
                param("from", "address", TypeDescriptor::Address, true),
                param("to", "address", TypeDescriptor::Address, true),
                param("value", "uint256", TypeDescriptor::Uint(256), false),
            ],
            false,
        ))
    }

    /// Lookup stub serving a fixed candidate list for every selector.
    struct FixedLookup(Vec<Arc<EventDefinition>>);

    impl EventLookup for FixedLookup {
        fn candidates(&self, _selector: &Selector) -> Vec<Arc<EventDefinition>> {
            self.0.clone()
        }
    }

    fn address_topic(byte: u8) -> B256 {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&[byte; 20]);
        B256::from(word)
    }

    fn transfer_log() -> RawLog {
        RawLog {
            address: Address::from_slice(&[0xcc; 20]),
            topics: vec![
                transfer_def().selector.0,
                address_topic(0xaa),
                address_topic(0xbb),
            ],
            data: U256::from(1_000u64).to_be_bytes::<32>().to_vec().into(),
            ..Default::default()
        }
    }

    #[test]
    fn transfer_decodes() {
        let decoder = EvmLogDecoder::new();
        let lookup = FixedLookup(vec![transfer_def()]);
        let event = decoder.decode_log(&transfer_log(), &lookup);

        assert!(event.is_matched());
        assert!(!event.ambiguous);
        assert_eq!(event.event_name(), Some("Transfer"));
        assert_eq!(
            event.field("from").unwrap().as_address().unwrap(),
            Address::from_slice(&[0xaa; 20])
        );
        assert_eq!(
            event.field("to").unwrap().as_address().unwrap(),
            Address::from_slice(&[0xbb; 20])
        );
        assert_eq!(
            event.field("value").unwrap().as_uint().unwrap(),
            U256::from(1_000u64)
        );
        // declaration order is preserved
        let keys: Vec<&String> = event.fields.keys().collect();
        assert_eq!(keys, ["from", "to", "value"]);
    }

    #[test]
    fn unknown_selector_preserves_log() {
        let decoder = EvmLogDecoder::new();
        let lookup = FixedLookup(Vec::new());
        let log = transfer_log();
        let event = decoder.decode_log(&log, &lookup);
        assert_eq!(event.status, DecodeStatus::UnknownSignature);
        assert_eq!(event.log, log);
    }

    #[test]
    fn topic_count_mismatch_fails() {
        let decoder = EvmLogDecoder::new();
        let lookup = FixedLookup(vec![transfer_def()]);
        let mut log = transfer_log();
        log.topics.pop();
        let event = decoder.decode_log(&log, &lookup);
        match &event.status {
            DecodeStatus::Failed { error } => {
                assert!(error.reason.contains("indexed parameter count mismatch"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn surplus_topics_fail() {
        let decoder = EvmLogDecoder::new();
        let lookup = FixedLookup(vec![transfer_def()]);
        let mut log = transfer_log();
        log.topics.push(B256::ZERO);
        let event = decoder.decode_log(&log, &lookup);
        assert!(matches!(event.status, DecodeStatus::Failed { .. }));
    }

    #[test]
    fn indexed_dynamic_param_is_opaque() {
        // Message(address indexed sender, string indexed note): the note
        // topic holds only a hash, which must surface as Opaque32.
        let def = Arc::new(EventDefinition::new(
            "Message",
            vec![
                param("sender", "address", TypeDescriptor::Address, true),
                param("note", "string", TypeDescriptor::String, true),
            ],
            false,
        ));
        let digest = B256::repeat_byte(0x5e);
        let log = RawLog {
            topics: vec![def.selector.0, address_topic(0xaa), digest],
            ..Default::default()
        };
        let decoder = EvmLogDecoder::new();
        let event = decoder.decode_log(&log, &FixedLookup(vec![def]));
        assert!(event.is_matched());
        assert_eq!(
            event.field("note").unwrap(),
            &DecodedValue::Opaque32(digest)
        );
    }

    #[test]
    fn colliding_candidates_first_valid_wins() {
        // Two definitions answering for one selector: the first expects a
        // bool in data (fails on 1000), the second a uint256 (succeeds).
        let bool_def = Arc::new(EventDefinition::new(
            "Flagged",
            vec![
                param("from", "address", TypeDescriptor::Address, true),
                param("to", "address", TypeDescriptor::Address, true),
                param("flag", "bool", TypeDescriptor::Bool, false),
            ],
            false,
        ));
        let lookup = FixedLookup(vec![bool_def, transfer_def()]);
        let decoder = EvmLogDecoder::new();
        let event = decoder.decode_log(&transfer_log(), &lookup);
        assert!(event.is_matched());
        assert!(event.ambiguous);
        assert_eq!(event.event_name(), Some("Transfer"));
    }

    #[test]
    fn all_candidates_failing_aggregates_reasons() {
        let bool_def = Arc::new(EventDefinition::new(
            "Flagged",
            vec![
                param("from", "address", TypeDescriptor::Address, true),
                param("to", "address", TypeDescriptor::Address, true),
                param("flag", "bool", TypeDescriptor::Bool, false),
            ],
            false,
        ));
        let short_def = Arc::new(EventDefinition::new(
            "Short",
            vec![param("who", "address", TypeDescriptor::Address, true)],
            false,
        ));
        let lookup = FixedLookup(vec![bool_def, short_def]);
        let decoder = EvmLogDecoder::new();
        let event = decoder.decode_log(&transfer_log(), &lookup);
        match &event.status {
            DecodeStatus::Failed { error } => {
                assert!(error.reason.contains("all 2 candidates failed"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(event.ambiguous);
    }

    #[test]
    fn anonymous_definition_via_decode_as() {
        // Anonymous events use every topic slot for indexed parameters.
        let def = Arc::new(EventDefinition::new(
            "Ping",
            vec![param("who", "address", TypeDescriptor::Address, true)],
            true,
        ));
        let log = RawLog {
            topics: vec![address_topic(0x77)],
            ..Default::default()
        };
        let decoder = EvmLogDecoder::new();
        let event = decoder.decode_as(&log, &def);
        assert!(event.is_matched());
        assert_eq!(
            event.field("who").unwrap().as_address().unwrap(),
            Address::from_slice(&[0x77; 20])
        );
    }

    #[test]
    fn rayon_batch_matches_sequential() {
        let decoder = EvmLogDecoder::new();
        let lookup = FixedLookup(vec![transfer_def()]);
        let logs: Vec<RawLog> = (0..64).map(|_| transfer_log()).collect();

        let parallel = decoder
            .decode_batch(&logs, &lookup, ErrorMode::Collect, None)
            .unwrap();
        let sequential =
            decode_batch_sequential(&decoder, &logs, &lookup, ErrorMode::Collect, None).unwrap();

        assert_eq!(parallel.events.len(), sequential.events.len());
        assert_eq!(parallel.errors.len(), sequential.errors.len());
        assert!(parallel.events.iter().all(|e| e.is_matched()));
    }
}
