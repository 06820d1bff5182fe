use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://blockstream.info/api";

/// Sentinel written for addresses whose lookup failed.
pub const BALANCE_FAILED: i64 = -1;

/// Narrow seam over the external balance oracle so pipelines can be tested
/// against deterministic mocks.
pub trait BalanceApi {
    /// Confirmed balance in satoshis for one address.
    fn fetch_balance(&self, address: &str) -> Result<u64>;
}

#[derive(Debug, Deserialize)]
struct AddressInfo {
    chain_stats: TxoStats,
}

#[derive(Debug, Default, Deserialize)]
struct TxoStats {
    #[serde(default)]
    funded_txo_sum: u64,
    #[serde(default)]
    spent_txo_sum: u64,
}

/// Blocking client for the Blockstream Esplora address endpoint.
pub struct BlockstreamClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl BlockstreamClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl BalanceApi for BlockstreamClient {
    fn fetch_balance(&self, address: &str) -> Result<u64> {
        let url = format!("{}/address/{}", self.base_url, address);
        let info: AddressInfo = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json()
            .with_context(|| format!("unexpected response for {}", address))?;
        Ok(info
            .chain_stats
            .funded_txo_sum
            .saturating_sub(info.chain_stats.spent_txo_sum))
    }
}

/// Pull unique addresses out of an input file, preserving first-seen order.
/// Accepts plain address-per-line files and CSV/TSV rows with the address in
/// the last field; a leading header row is ignored.
pub fn extract_addresses(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
    );

    let mut seen = HashSet::new();
    let mut addresses = Vec::new();
    let mut header_checked = false;

    for line in reader.lines() {
        let line = line?;
        let row = line.trim();
        if row.is_empty() || row.starts_with('#') {
            continue;
        }
        if !header_checked {
            header_checked = true;
            if is_header(row) {
                continue;
            }
        }
        let addr = row.rsplit(&[',', '\t'][..]).next().unwrap_or("").trim();
        if addr.is_empty() {
            continue;
        }
        if seen.insert(addr.to_string()) {
            addresses.push(addr.to_string());
        }
    }

    Ok(addresses)
}

fn is_header(row: &str) -> bool {
    let lower = row.to_ascii_lowercase();
    lower.starts_with("hex_private_key")
        || lower.starts_with("mnemonic")
        || lower.starts_with("address")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CheckStats {
    pub checked: usize,
    pub failed: usize,
}

/// Query balances sequentially, one request at a time, and write
/// `address,balance` CSV. A failed lookup records [`BALANCE_FAILED`] and the
/// run continues; given a stable API the output is idempotent.
pub fn check_balances(
    api: &dyn BalanceApi,
    addresses: &[String],
    output: &Path,
    delay: Duration,
    limit: Option<usize>,
) -> Result<CheckStats> {
    let addresses = match limit {
        Some(n) => &addresses[..n.min(addresses.len())],
        None => addresses,
    };

    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("failed to create {}", output.display()))?,
    );
    writeln!(writer, "address,balance")?;

    let mut stats = CheckStats::default();

    for (idx, address) in addresses.iter().enumerate() {
        let balance = match api.fetch_balance(address) {
            Ok(sats) => sats as i64,
            Err(e) => {
                warn!("balance lookup failed for {}: {}", address, e);
                stats.failed += 1;
                BALANCE_FAILED
            }
        };
        writeln!(writer, "{},{}", address, balance)?;
        stats.checked += 1;

        if (idx + 1) % 50 == 0 {
            info!("checked {}/{} addresses", idx + 1, addresses.len());
        }
        if !delay.is_zero() && idx + 1 < addresses.len() {
            thread::sleep(delay);
        }
    }

    writer.flush()?;
    Ok(stats)
}
