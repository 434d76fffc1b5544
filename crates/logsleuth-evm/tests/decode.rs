//! End-to-end decode tests: ABI JSON → catalog → raw log → decoded event.
//!
//! The ERC-20 case loads a golden fixture from `fixtures/`; the rest
//! build their logs in place, taking selectors from the built catalog so
//! the hashes are exercised rather than assumed.

use alloy_primitives::{Address, B256, U256};
use logsleuth_catalog::EventCatalog;
use logsleuth_core::decoder::LogDecoder;
use logsleuth_core::event::{DecodeStatus, RawLog};
use logsleuth_core::hex::WORD;
use logsleuth_core::value::DecodedValue;
use logsleuth_evm::{encode_region, EvmLogDecoder};

/// The fixtures live two levels above the crate root.
fn fixture(name: &str) -> serde_json::Value {
    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../fixtures");
    path.push(name);
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("fixture {}: {e}", path.display()));
    serde_json::from_str(&json).expect("fixture JSON")
}

fn catalog_from(json: &str) -> EventCatalog {
    let (catalog, diagnostics) = EventCatalog::from_abi_json(json).expect("build catalog");
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    catalog
}

fn uint_word(v: u64) -> [u8; WORD] {
    U256::from(v).to_be_bytes::<WORD>()
}

// ─── ERC-20 Transfer golden fixture ──────────────────────────────────────────

#[test]
fn erc20_transfer_golden() {
    let fixture = fixture("erc20-transfer.json");

    let catalog = catalog_from(&fixture["abi"].to_string());
    let log: RawLog = serde_json::from_value(fixture["log"].clone()).expect("fixture log");

    let decoder = EvmLogDecoder::new();
    let event = decoder.decode_log(&log, &catalog);

    assert_eq!(event.status, DecodeStatus::Matched);
    assert!(!event.ambiguous);
    assert_eq!(event.event_name(), Some("Transfer"));

    let expected = &fixture["expected"];
    let from: Address = expected["from"].as_str().unwrap().parse().unwrap();
    let to: Address = expected["to"].as_str().unwrap().parse().unwrap();
    let value: U256 = expected["value"].as_str().unwrap().parse().unwrap();

    assert_eq!(event.field("from").unwrap().as_address(), Some(from));
    assert_eq!(event.field("to").unwrap().as_address(), Some(to));
    assert_eq!(event.field("value").unwrap().as_uint(), Some(value));

    // The raw log rides along untouched.
    assert_eq!(event.log, log);
}

#[test]
fn unknown_selector_falls_through_with_raw_bytes() {
    let fixture = fixture("erc20-transfer.json");
    let catalog = catalog_from(&fixture["abi"].to_string());
    let mut log: RawLog = serde_json::from_value(fixture["log"].clone()).unwrap();
    log.topics[0] = B256::repeat_byte(0x99);

    let event = EvmLogDecoder::new().decode_log(&log, &catalog);
    assert_eq!(event.status, DecodeStatus::UnknownSignature);
    assert!(event.event.is_none());
    assert!(event.fields.is_empty());
    assert_eq!(event.log.topics, log.topics);
    assert_eq!(event.log.data, log.data);
}

// ─── Dynamic string parameter ────────────────────────────────────────────────

const MESSAGE_ABI: &str = r#"[{
    "type": "event",
    "name": "Message",
    "inputs": [
        {"name": "sender", "type": "address", "indexed": true},
        {"name": "note", "type": "string", "indexed": false}
    ]
}]"#;

#[test]
fn dynamic_string_decodes_regardless_of_padding_bytes() {
    let catalog = catalog_from(MESSAGE_ABI);
    let def = &catalog.definitions()[0];
    assert_eq!(
        def.selector.to_string(),
        "0x811f7cff0a3374ff67cccc3726035d34ba70410e0256818a891e4d6acc01d88e"
    );

    // offset word → length word → UTF-8 content right-padded to a word
    // boundary with junk. Padding is decode-irrelevant.
    let mut data = Vec::new();
    data.extend_from_slice(&uint_word(32));
    data.extend_from_slice(&uint_word(13));
    let mut content = [0xa5u8; WORD];
    content[..13].copy_from_slice(b"hello sleuths");
    data.extend_from_slice(&content);

    let mut sender = [0u8; WORD];
    sender[12..].copy_from_slice(&[0x42; 20]);
    let log = RawLog {
        address: Address::from_slice(&[0x01; 20]),
        topics: vec![def.selector.0, B256::from(sender)],
        data: data.into(),
        ..Default::default()
    };

    let event = EvmLogDecoder::new().decode_log(&log, &catalog);
    assert_eq!(event.status, DecodeStatus::Matched);
    assert_eq!(
        event.field("note").unwrap(),
        &DecodedValue::Str("hello sleuths".into())
    );
}

// ─── Strict elementary rules surface as Failed, not coerced values ───────────

#[test]
fn boolean_two_is_a_decode_error() {
    let catalog = catalog_from(
        r#"[{
            "type": "event",
            "name": "Flag",
            "inputs": [{"name": "on", "type": "bool", "indexed": false}]
        }]"#,
    );
    let def = &catalog.definitions()[0];
    assert_eq!(
        def.selector.to_string(),
        "0xe145e7af4325483bf4c6332638929bf553f2f21bac737ea4d5b88d8a90336888"
    );

    let log = RawLog {
        topics: vec![def.selector.0],
        data: uint_word(2).to_vec().into(),
        ..Default::default()
    };
    let event = EvmLogDecoder::new().decode_log(&log, &catalog);
    match &event.status {
        DecodeStatus::Failed { error } => {
            assert!(error.reason.contains("neither 0 nor 1"));
            assert_eq!(error.path, "on");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[test]
fn dirty_address_padding_is_a_decode_error() {
    let fixture = fixture("erc20-transfer.json");
    let catalog = catalog_from(&fixture["abi"].to_string());
    let mut log: RawLog = serde_json::from_value(fixture["log"].clone()).unwrap();

    let mut corrupted = log.topics[1].0;
    corrupted[0] = 0xff;
    log.topics[1] = B256::from(corrupted);

    let event = EvmLogDecoder::new().decode_log(&log, &catalog);
    match &event.status {
        DecodeStatus::Failed { error } => {
            assert!(error.reason.contains("padding"));
            assert_eq!(error.path, "from");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

// ─── Nested tuple arrays, encode → decode ────────────────────────────────────

const ORDER_ABI: &str = r#"[{
    "type": "event",
    "name": "OrderPlaced",
    "inputs": [
        {"name": "taker", "type": "address", "indexed": true},
        {
            "name": "orders",
            "type": "tuple[]",
            "indexed": false,
            "components": [
                {"name": "maker", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ]
        }
    ]
}]"#;

#[test]
fn nested_tuple_array_roundtrips_through_the_log_decoder() {
    let catalog = catalog_from(ORDER_ABI);
    let def = &catalog.definitions()[0];
    assert_eq!(def.signature, "OrderPlaced(address,(address,uint256)[])");
    assert_eq!(
        def.selector.to_string(),
        "0xb9d2dfb62aee71f34e682a9f6e23e7f0af1b65f5a6e7a2194f2e1a6beff4a8ef"
    );

    let orders = DecodedValue::List(vec![
        DecodedValue::Record(vec![
            (
                "maker".into(),
                DecodedValue::Address(Address::from_slice(&[0x11; 20])),
            ),
            ("amount".into(), DecodedValue::Uint(U256::from(5u64))),
        ]),
        DecodedValue::Record(vec![
            (
                "maker".into(),
                DecodedValue::Address(Address::from_slice(&[0x22; 20])),
            ),
            ("amount".into(), DecodedValue::Uint(U256::MAX)),
        ]),
    ]);

    let orders_descriptor = def.data_params()[0].descriptor.clone();
    let data = encode_region(&[(&orders_descriptor, &orders)]).unwrap();

    let mut taker = [0u8; WORD];
    taker[12..].copy_from_slice(&[0x77; 20]);
    let log = RawLog {
        topics: vec![def.selector.0, B256::from(taker)],
        data: data.into(),
        ..Default::default()
    };

    let event = EvmLogDecoder::new().decode_log(&log, &catalog);
    assert_eq!(event.status, DecodeStatus::Matched);
    assert_eq!(
        event.field("taker").unwrap().as_address(),
        Some(Address::from_slice(&[0x77; 20]))
    );
    assert_eq!(event.field("orders").unwrap(), &orders);
}

// ─── Equivalent duplicate definitions ────────────────────────────────────────

#[test]
fn renamed_parameters_decode_identically() {
    // Two ABIs declaring the same canonical shape with different names
    // must yield the same selector and equivalent decodes.
    let weth_style = r#"[{
        "type": "event",
        "name": "Transfer",
        "inputs": [
            {"name": "src", "type": "address", "indexed": true},
            {"name": "dst", "type": "address", "indexed": true},
            {"name": "wad", "type": "uint256", "indexed": false}
        ]
    }]"#;

    let fixture = fixture("erc20-transfer.json");
    let log: RawLog = serde_json::from_value(fixture["log"].clone()).unwrap();

    let erc20 = catalog_from(&fixture["abi"].to_string());
    let weth = catalog_from(weth_style);
    assert_eq!(
        erc20.definitions()[0].selector,
        weth.definitions()[0].selector
    );

    let decoder = EvmLogDecoder::new();
    let a = decoder.decode_log(&log, &erc20);
    let b = decoder.decode_log(&log, &weth);
    assert_eq!(a.status, DecodeStatus::Matched);
    assert_eq!(b.status, DecodeStatus::Matched);

    let a_values: Vec<&DecodedValue> = a.fields.values().collect();
    let b_values: Vec<&DecodedValue> = b.fields.values().collect();
    assert_eq!(a_values, b_values);
}
