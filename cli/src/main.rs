//! LogSleuth CLI — decode EVM event logs against contract ABIs.
//!
//! # Commands
//! ```text
//! logsleuth events      --abi <path.json>...
//! logsleuth decode-log  --abi <path.json>... --topics <hash>... --data <hex>
//! logsleuth decode-file --abi <path.json>... --input <rows.jsonl>
//! logsleuth fetch-abi   --address <addr> [--chain-id <num>] [--follow-proxy]
//! logsleuth bench       [--iterations <N>]
//! logsleuth info
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use logsleuth_catalog::{BuildDiagnostic, EventCatalog};
use logsleuth_core::decoder::ErrorMode;
use logsleuth_observability::{init_tracing, LogConfig};
use std::path::PathBuf;

mod cmd_decode;
mod cmd_events;

#[derive(Parser)]
#[command(
    name = "logsleuth",
    about = "ABI-driven EVM event-log decoder",
    long_about = "
LogSleuth CLI: reconstruct structured, typed events from raw on-chain log
rows using standard Ethereum ABI JSON.

ENVIRONMENT VARIABLES:
  LOGSLEUTH_ETHERSCAN_KEY   Etherscan API key (for fetch-abi)
",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-structured logs
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ErrorModeArg {
    /// Drop rows that fail to decode
    Skip,
    /// Keep going but report failed rows at the end
    Collect,
    /// Abort on the first failed row
    Throw,
}

impl From<ErrorModeArg> for ErrorMode {
    fn from(mode: ErrorModeArg) -> Self {
        match mode {
            ErrorModeArg::Skip => ErrorMode::Skip,
            ErrorModeArg::Collect => ErrorMode::Collect,
            ErrorModeArg::Throw => ErrorMode::Throw,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the events of an ABI: name, canonical signature, selector
    Events {
        /// ABI JSON files or directories to scan
        #[arg(long, num_args = 1.., required = true)]
        abi: Vec<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a single event log from raw topics + data
    #[command(name = "decode-log")]
    DecodeLog {
        /// ABI JSON files or directories
        #[arg(long, num_args = 1.., required = true)]
        abi: Vec<PathBuf>,
        /// topics[0] = selector, topics[1..] = indexed params
        #[arg(long, num_args = 1..)]
        topics: Vec<String>,
        /// Non-indexed params (hex, 0x-prefixed)
        #[arg(long, default_value = "0x")]
        data: String,
        /// Emitting contract address
        #[arg(long)]
        address: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Batch-decode a JSON-lines file of raw log rows
    #[command(name = "decode-file")]
    DecodeFile {
        /// ABI JSON files or directories
        #[arg(long, num_args = 1.., required = true)]
        abi: Vec<PathBuf>,
        /// JSON-lines file, one raw log row per line
        #[arg(long)]
        input: PathBuf,
        /// How to handle rows that fail structural decoding
        #[arg(long, value_enum, default_value_t = ErrorModeArg::Collect)]
        error_mode: ErrorModeArg,
        /// Rows per chunk
        #[arg(long, default_value_t = 10_000)]
        chunk_size: usize,
        /// Print each decoded event as a JSON line
        #[arg(long)]
        json: bool,
    },

    /// Fetch a contract ABI from Sourcify or Etherscan
    #[command(name = "fetch-abi")]
    FetchAbi {
        /// Contract address
        #[arg(long)]
        address: String,
        /// EVM chain ID (default: 1 = Ethereum mainnet)
        #[arg(long, default_value_t = 1)]
        chain_id: u64,
        /// Save the ABI to this file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also fetch the implementation ABI when the address is a proxy
        #[arg(long)]
        follow_proxy: bool,
    },

    /// Benchmark decode throughput on synthetic Transfer logs
    Bench {
        /// Number of synthetic rows
        #[arg(long, default_value_t = 100_000)]
        iterations: u64,
    },

    /// Show build and capability info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::with_level(if cli.verbose { "debug" } else { "info" });
    log_config.json = cli.log_json;
    init_tracing(&log_config);

    match cli.command {
        Commands::Events { abi, json } => cmd_events::run(&abi, json),

        Commands::DecodeLog { abi, topics, data, address, json } => {
            cmd_decode::decode_log(&abi, &topics, &data, address.as_deref(), json)
        }

        Commands::DecodeFile { abi, input, error_mode, chunk_size, json } => {
            cmd_decode::decode_file(&abi, &input, error_mode.into(), chunk_size, json)
        }

        Commands::FetchAbi { address, chain_id, output, follow_proxy } => {
            cmd_fetch_abi(&address, chain_id, output.as_deref(), follow_proxy).await
        }

        Commands::Bench { iterations } => cmd_bench(iterations),

        Commands::Info => cmd_info(),
    }
}

/// Load and merge ABI JSON files into one catalog. Directories are
/// scanned recursively for `*.json`.
pub(crate) fn load_catalog(paths: &[PathBuf]) -> Result<(EventCatalog, Vec<BuildDiagnostic>)> {
    let mut files: Vec<PathBuf> = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            files.push(path.clone());
        }
    }
    anyhow::ensure!(!files.is_empty(), "no ABI JSON files found");

    let (catalog, diagnostics) =
        EventCatalog::load_files(&files).context("loading ABI files")?;
    anyhow::ensure!(!catalog.is_empty(), "no decodable events in the given ABIs");
    Ok((catalog, diagnostics))
}

pub(crate) fn report_diagnostics(diagnostics: &[BuildDiagnostic]) {
    for diagnostic in diagnostics {
        tracing::warn!("catalog: {diagnostic}");
    }
}

// ─── Inline commands ─────────────────────────────────────────────────────────

async fn cmd_fetch_abi(
    address: &str,
    chain_id: u64,
    output: Option<&std::path::Path>,
    follow_proxy: bool,
) -> Result<()> {
    use logsleuth_catalog::AbiFetcher;

    let mut fetcher = AbiFetcher::new()?.with_calls_per_second(5.0);
    if let Ok(key) = std::env::var("LOGSLEUTH_ETHERSCAN_KEY") {
        fetcher = fetcher.with_etherscan_key(key);
    }

    let abi = if follow_proxy {
        let (abi, implementation) = fetcher.fetch_with_implementation(address).await?;
        match implementation {
            Some(impl_abi) => merge_abi_documents(&abi, &impl_abi)?,
            None => abi,
        }
    } else {
        fetcher.fetch_abi(chain_id, address).await?
    };

    match output {
        Some(path) => {
            std::fs::write(path, &abi)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {} bytes to {}", abi.len(), path.display());
        }
        None => println!("{abi}"),
    }
    Ok(())
}

/// Concatenate two ABI documents entry-wise (proxy + implementation).
fn merge_abi_documents(a: &str, b: &str) -> Result<String> {
    let mut entries: Vec<serde_json::Value> =
        serde_json::from_str(a).context("parsing proxy ABI")?;
    let more: Vec<serde_json::Value> =
        serde_json::from_str(b).context("parsing implementation ABI")?;
    entries.extend(more);
    Ok(serde_json::to_string(&entries)?)
}

fn cmd_bench(iterations: u64) -> Result<()> {
    use alloy_primitives::{Address, B256, U256};
    use logsleuth_core::decoder::LogDecoder;
    use logsleuth_core::event::RawLog;
    use logsleuth_evm::EvmLogDecoder;
    use std::time::Instant;

    const ERC20_ABI: &str = r#"[{
        "type": "event",
        "name": "Transfer",
        "inputs": [
            {"name": "from", "type": "address", "indexed": true},
            {"name": "to", "type": "address", "indexed": true},
            {"name": "value", "type": "uint256", "indexed": false}
        ]
    }]"#;

    let (catalog, _) = EventCatalog::from_abi_json(ERC20_ABI)?;
    let selector = catalog.definitions()[0].selector.0;

    let batch: Vec<RawLog> = (0..iterations)
        .map(|i| {
            let mut from = [0u8; 32];
            from[31] = (i & 0xff) as u8;
            let mut to = [0u8; 32];
            to[31] = ((i + 1) & 0xff) as u8;
            RawLog {
                address: Address::from_slice(&[0xa0; 20]),
                topics: vec![selector, B256::from(from), B256::from(to)],
                data: U256::from(i).to_be_bytes::<32>().to_vec().into(),
                block_number: Some(19_000_000 + i),
                log_index: Some(0),
                tx_hash: None,
            }
        })
        .collect();

    let decoder = EvmLogDecoder::new();
    println!("Benchmarking: {iterations} synthetic Transfer rows ...");

    let start = Instant::now();
    let outcome = decoder.decode_batch(&batch, &catalog, ErrorMode::Skip, None)?;
    let elapsed = start.elapsed();

    let decoded = outcome.events.len() as u64;
    let throughput = iterations as f64 / elapsed.as_secs_f64();
    println!("Results:");
    println!("  Total:      {iterations} rows");
    println!(
        "  Decoded:    {decoded} ({:.1}%)",
        100.0 * decoded as f64 / iterations as f64
    );
    println!("  Duration:   {:.3}s", elapsed.as_secs_f64());
    println!("  Throughput: {throughput:.0} rows/sec");
    Ok(())
}

fn cmd_info() -> Result<()> {
    println!("LogSleuth v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Capabilities:");
    println!("  - ABI-generic event decoding (head/tail, nested arrays and tuples)");
    println!("  - Strict elementary word rules (padding, bool, integer widths)");
    println!("  - Selector catalog with collision tolerance and build diagnostics");
    println!("  - Opaque handling of dynamic indexed parameters");
    println!("  - Parallel batch decode (Rayon) with chunking and error modes");
    println!("  - Remote ABI fetch (Sourcify + Etherscan, proxy-aware)");
    println!();
    println!("Inputs:  standard Ethereum ABI JSON; raw log rows as JSON lines");
    println!("Outputs: typed decoded events with Matched / UnknownSignature /");
    println!("         Failed status per row");
    Ok(())
}
