//! `logsleuth decode-log` and `logsleuth decode-file`.

use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use logsleuth_batch::{BatchEngine, BatchRequest};
use logsleuth_core::decoder::{ErrorMode, LogDecoder};
use logsleuth_core::event::{DecodeStatus, DecodedEvent, RawLog};
use logsleuth_core::hex::decode_hex;
use logsleuth_evm::EvmLogDecoder;
use logsleuth_observability::DecodeMetrics;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub fn decode_log(
    abi_paths: &[PathBuf],
    topics: &[String],
    data: &str,
    address: Option<&str>,
    as_json: bool,
) -> Result<()> {
    let (catalog, diagnostics) = crate::load_catalog(abi_paths)?;
    crate::report_diagnostics(&diagnostics);

    let topics: Vec<B256> = topics
        .iter()
        .map(|t| t.parse::<B256>().with_context(|| format!("invalid topic `{t}`")))
        .collect::<Result<_>>()?;
    let data = decode_hex(data).context("invalid data hex")?;
    let address: Address = match address {
        Some(a) => a.parse().context("invalid contract address")?,
        None => Address::ZERO,
    };

    let log = RawLog {
        address,
        topics,
        data: data.into(),
        ..Default::default()
    };

    let decoder = EvmLogDecoder::new();
    let event = decoder.decode_log(&log, &catalog);
    print_event(&event, as_json)?;

    if matches!(event.status, DecodeStatus::Failed { .. }) {
        anyhow::bail!("decode failed");
    }
    Ok(())
}

pub fn decode_file(
    abi_paths: &[PathBuf],
    input: &Path,
    error_mode: ErrorMode,
    chunk_size: usize,
    as_json: bool,
) -> Result<()> {
    let (catalog, diagnostics) = crate::load_catalog(abi_paths)?;
    crate::report_diagnostics(&diagnostics);

    let logs = read_rows(input)?;
    let total = logs.len();

    let engine = BatchEngine::new(Arc::new(catalog), Arc::new(EvmLogDecoder::new()));
    let request = BatchRequest::new(logs)
        .chunk_size(chunk_size)
        .error_mode(error_mode);

    let metrics = DecodeMetrics::global();
    let start = Instant::now();
    let report = engine.decode(request)?;
    metrics.record_batch(total as u64, start.elapsed().as_secs_f64() * 1_000.0);

    for event in &report.events {
        match &event.status {
            DecodeStatus::Matched => {
                if let Some(name) = event.event_name() {
                    metrics.record_matched(name);
                }
            }
            DecodeStatus::UnknownSignature => metrics.record_unknown(),
            DecodeStatus::Failed { error } => metrics.record_failure(&error.path),
        }
    }
    for (_, error) in &report.errors {
        metrics.record_failure(&error.path);
    }

    if as_json {
        for event in &report.events {
            println!("{}", serde_json::to_string(event)?);
        }
    }

    eprintln!(
        "{} rows: {} matched, {} unknown signature, {} failed",
        report.total_input,
        report.matched_count(),
        report.unknown_count(),
        report.errors.len()
    );
    for (index, error) in &report.errors {
        eprintln!("  row {index}: {error}");
    }
    Ok(())
}

/// Read raw log rows from a JSON-lines file (blank lines skipped).
fn read_rows(input: &Path) -> Result<Vec<RawLog>> {
    let file = std::fs::File::open(input)
        .with_context(|| format!("opening {}", input.display()))?;
    let mut rows = Vec::new();
    for (lineno, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: RawLog = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", input.display(), lineno + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

fn print_event(event: &DecodedEvent, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(event)?);
        return Ok(());
    }

    match &event.status {
        DecodeStatus::Matched => {
            if let Some(def) = &event.event {
                println!("Event:    {}", def.signature);
                println!("Selector: {}", def.selector);
            }
            if event.ambiguous {
                println!("Note:     selector was ambiguous; first valid candidate shown");
            }
            println!("Fields:");
            for (name, value) in &event.fields {
                println!("  {name}: {value}");
            }
        }
        DecodeStatus::UnknownSignature => {
            println!("Unknown signature — no catalog entry matches topics[0].");
            println!("Topics: {:?}", event.log.topics);
            println!("Data:   {}", event.log.data);
        }
        DecodeStatus::Failed { error } => {
            println!("Decode failed: {error}");
        }
    }
    Ok(())
}
