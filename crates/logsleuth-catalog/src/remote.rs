//! Remote ABI fetching from public blockchain explorers.
//!
//! Supports:
//! - **Etherscan** (and compatible forks) — requires an API key for real
//!   throughput, follows proxy contracts to their implementation ABI
//! - **Sourcify** — decentralized, no API key required
//!
//! Explorers rate-limit aggressively, so every request goes through a
//! minimum-interval throttle and a capped-backoff retry loop.
//!
//! Requires the `remote` feature flag (enables `reqwest` + `tokio`):
//!
//! ```toml
//! logsleuth-catalog = { version = "0.1", features = ["remote"] }
//! ```

use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ABI not found for {address} on chain {chain_id}")]
    NotFound { chain_id: u64, address: String },

    #[error("explorer API error: {message}")]
    ExplorerError { message: String },

    #[error("invalid ABI JSON returned from {explorer}: {reason}")]
    InvalidAbi { explorer: String, reason: String },

    #[error("rate limited by {explorer} after {attempts} attempts")]
    RateLimited { explorer: String, attempts: u32 },
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    message: String,
    result: String,
}

/// `getsourcecode` result entry — only the proxy fields matter here.
#[derive(Debug, Deserialize)]
struct SourceCodeEntry {
    #[serde(rename = "Proxy", default)]
    proxy: String,
    #[serde(rename = "Implementation", default)]
    implementation: String,
}

#[derive(Debug, Deserialize)]
struct SourceCodeResponse {
    status: String,
    result: Vec<SourceCodeEntry>,
}

/// Remote ABI fetcher with request throttling and retry.
///
/// Prefers Sourcify (no API key) and falls back to Etherscan.
pub struct AbiFetcher {
    client: Client,
    sourcify_base: String,
    etherscan_base: String,
    etherscan_api_key: Option<String>,
    /// Minimum spacing between outgoing requests
    min_interval: Duration,
    max_retries: u32,
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl AbiFetcher {
    /// Default endpoints, 5 calls/second, 3 retries.
    pub fn new() -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("logsleuth/0.1 (https://github.com/logsleuth/logsleuth)")
            .build()?;

        Ok(Self {
            client,
            sourcify_base: "https://sourcify.dev/server".into(),
            etherscan_base: "https://api.etherscan.io/api".into(),
            etherscan_api_key: None,
            min_interval: Duration::from_millis(200),
            max_retries: 3,
            last_request: tokio::sync::Mutex::new(None),
        })
    }

    /// Set the Etherscan API key (required for real Etherscan throughput).
    pub fn with_etherscan_key(mut self, key: impl Into<String>) -> Self {
        self.etherscan_api_key = Some(key.into());
        self
    }

    /// Use an Etherscan-compatible fork:
    /// - Arbiscan:     `https://api.arbiscan.io/api`
    /// - Polygonscan:  `https://api.polygonscan.com/api`
    /// - Basescan:     `https://api.basescan.org/api`
    pub fn with_etherscan_base(mut self, url: impl Into<String>) -> Self {
        self.etherscan_base = url.into();
        self
    }

    /// Use a private/self-hosted Sourcify instance.
    pub fn with_sourcify_base(mut self, url: impl Into<String>) -> Self {
        self.sourcify_base = url.into();
        self
    }

    /// Throttle outgoing requests to at most `calls_per_second`.
    pub fn with_calls_per_second(mut self, calls_per_second: f64) -> Self {
        if calls_per_second > 0.0 {
            self.min_interval = Duration::from_secs_f64(1.0 / calls_per_second);
        }
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Fetch the ABI with automatic fallback: Sourcify first (no API
    /// key), then Etherscan. Returns the ABI JSON document.
    pub async fn fetch_abi(&self, chain_id: u64, address: &str) -> Result<String, RemoteError> {
        match self.fetch_from_sourcify(chain_id, address).await {
            Ok(abi) => return Ok(abi),
            Err(RemoteError::NotFound { .. }) => {
                debug!(%address, "not on Sourcify, falling back to Etherscan");
            }
            Err(other) => return Err(other),
        }
        self.fetch_from_etherscan(address).await
    }

    /// Fetch a contract's ABI from Etherscan, plus its implementation's
    /// ABI when the explorer reports it as a proxy. Decoding a proxy's
    /// logs needs both merged into one catalog.
    pub async fn fetch_with_implementation(
        &self,
        address: &str,
    ) -> Result<(String, Option<String>), RemoteError> {
        let abi = self.fetch_from_etherscan(address).await?;

        let implementation = match self.proxy_implementation(address).await {
            Ok(impl_address) => impl_address,
            Err(error) => {
                warn!(%address, %error, "could not resolve proxy metadata");
                None
            }
        };

        let implementation_abi = match implementation {
            Some(impl_address) => match self.fetch_from_etherscan(&impl_address).await {
                Ok(abi) => Some(abi),
                Err(error) => {
                    warn!(implementation = %impl_address, %error, "could not fetch implementation ABI");
                    None
                }
            },
            None => None,
        };

        Ok((abi, implementation_abi))
    }

    /// Fetch ABI JSON from an Etherscan-compatible explorer.
    pub async fn fetch_from_etherscan(&self, address: &str) -> Result<String, RemoteError> {
        let api_key = self.etherscan_api_key.as_deref().unwrap_or("YourApiKeyToken");
        let response = self
            .send_with_retry("Etherscan", || {
                self.client.get(&self.etherscan_base).query(&[
                    ("module", "contract"),
                    ("action", "getabi"),
                    ("address", address),
                    ("apikey", api_key),
                ])
            })
            .await?;

        let body: EtherscanResponse = response.json().await?;
        if body.status != "1" {
            if body.message.to_lowercase().contains("rate limit") {
                return Err(RemoteError::RateLimited {
                    explorer: "Etherscan".into(),
                    attempts: self.max_retries,
                });
            }
            return Err(RemoteError::ExplorerError {
                message: body.message,
            });
        }

        serde_json::from_str::<serde_json::Value>(&body.result).map_err(|e| {
            RemoteError::InvalidAbi {
                explorer: "Etherscan".into(),
                reason: e.to_string(),
            }
        })?;
        Ok(body.result)
    }

    /// Fetch ABI JSON from Sourcify.
    pub async fn fetch_from_sourcify(
        &self,
        chain_id: u64,
        address: &str,
    ) -> Result<String, RemoteError> {
        let address = normalize_address(address);

        for match_type in ["full_match", "partial_match"] {
            let url = format!("{}/v2/contract/{chain_id}/{address}", self.sourcify_base);
            let response = self
                .send_with_retry("Sourcify", || {
                    self.client.get(&url).query(&[("matchType", match_type)])
                })
                .await?;

            match response.status().as_u16() {
                200 => {
                    let json: serde_json::Value = response.json().await?;
                    if let Some(abi) = json.get("abi") {
                        return Ok(abi.to_string());
                    }
                }
                404 => continue,
                _ => {}
            }
        }

        Err(RemoteError::NotFound {
            chain_id,
            address,
        })
    }

    /// Ask the explorer whether `address` is a proxy; returns the
    /// implementation address if so.
    async fn proxy_implementation(&self, address: &str) -> Result<Option<String>, RemoteError> {
        let api_key = self.etherscan_api_key.as_deref().unwrap_or("YourApiKeyToken");
        let response = self
            .send_with_retry("Etherscan", || {
                self.client.get(&self.etherscan_base).query(&[
                    ("module", "contract"),
                    ("action", "getsourcecode"),
                    ("address", address),
                    ("apikey", api_key),
                ])
            })
            .await?;

        let body: SourceCodeResponse = response.json().await?;
        if body.status != "1" {
            return Ok(None);
        }
        Ok(body
            .result
            .first()
            .filter(|entry| entry.proxy == "1" && !entry.implementation.is_empty())
            .map(|entry| entry.implementation.clone()))
    }

    /// Send a request through the throttle, retrying transport errors,
    /// 429s, and 5xxs with capped exponential backoff.
    async fn send_with_retry(
        &self,
        source: &str,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RemoteError> {
        let mut attempt: u32 = 0;
        loop {
            self.throttle().await;

            let result = build().send().await;
            let retriable = match &result {
                Ok(response) => {
                    let code = response.status().as_u16();
                    code == 429 || code >= 500
                }
                Err(error) => error.is_timeout() || error.is_connect(),
            };

            if !retriable {
                return Ok(result?);
            }
            if attempt >= self.max_retries {
                return match result {
                    Ok(response) if response.status().as_u16() == 429 => {
                        Err(RemoteError::RateLimited {
                            explorer: source.into(),
                            attempts: attempt + 1,
                        })
                    }
                    Ok(response) => Ok(response),
                    Err(error) => Err(error.into()),
                };
            }

            let backoff = backoff_delay(attempt);
            debug!(source, attempt, ?backoff, "retrying explorer request");
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    /// Enforce the minimum spacing between outgoing requests.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let millis = 500u64.saturating_mul(1 << attempt.min(4));
    Duration::from_millis(millis.min(8_000))
}

fn normalize_address(address: &str) -> String {
    let address = address.to_lowercase();
    if address.starts_with("0x") {
        address
    } else {
        format!("0x{address}")
    }
}
