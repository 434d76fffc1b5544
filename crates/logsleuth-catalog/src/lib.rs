//! # logsleuth-catalog
//!
//! The event catalog: builds, from standard Ethereum ABI JSON, a mapping
//! from identifying hash (selector) to candidate event definitions.
//!
//! Building is a pure function with no hidden global state. Malformed
//! entries are skipped with a recorded diagnostic — one broken interface
//! entry never prevents decoding of the others. A built catalog is
//! read-only and shareable across any number of concurrent decode calls.
//!
//! The optional `remote` feature adds a rate-limited, retrying ABI
//! fetcher for Etherscan-compatible explorers and Sourcify.

pub mod abi;
pub mod catalog;
#[cfg(feature = "remote")]
pub mod remote;

pub use abi::{parse_abi_json, AbiEntry, AbiInput};
pub use catalog::{BuildDiagnostic, EventCatalog};

#[cfg(feature = "remote")]
pub use remote::{AbiFetcher, RemoteError};
