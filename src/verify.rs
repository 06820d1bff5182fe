use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bip39::Mnemonic;
use log::warn;

use crate::address;
use crate::cli::Coin;

/// A candidate secret read from an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Secret {
    Mnemonic(String),
    HexKey([u8; 32]),
    Wif(String),
    Extended(String),
}

impl Secret {
    /// Heuristic type detection: phrases contain spaces, extended keys carry
    /// an xprv/xpub-style prefix, raw keys are 64 hex chars, mainnet WIF
    /// starts with 5/K/L at 51-52 chars.
    pub fn detect(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if s.contains(' ') {
            return Some(Secret::Mnemonic(s.to_string()));
        }
        if s.starts_with("xprv")
            || s.starts_with("xpub")
            || s.starts_with("tprv")
            || s.starts_with("tpub")
        {
            return Some(Secret::Extended(s.to_string()));
        }
        if s.len() == 64 {
            if let Ok(bytes) = hex::decode(s) {
                let mut key = [0u8; 32];
                key.copy_from_slice(&bytes);
                return Some(Secret::HexKey(key));
            }
        }
        if (s.len() == 51 || s.len() == 52) && matches!(s.as_bytes()[0], b'5' | b'K' | b'L') {
            return Some(Secret::Wif(s.to_string()));
        }
        None
    }

    /// Resolve to raw key bytes. Mnemonics go through BIP39 seed plus the
    /// coin's BIP44 path at index 0.
    pub fn to_key(&self, coin: &Coin) -> Result<[u8; 32]> {
        match self {
            Secret::Mnemonic(phrase) => {
                let mnemonic =
                    Mnemonic::parse(phrase).map_err(|e| anyhow!("invalid mnemonic: {}", e))?;
                let seed = mnemonic.to_seed("");
                address::derive_key_from_seed(&seed, &coin.derivation_path(0))
            }
            Secret::HexKey(key) => Ok(*key),
            Secret::Wif(wif) => address::wif_to_key(wif),
            // xpub/tprv/tpub carry no usable mainnet private key and fail here
            Secret::Extended(xprv) => address::xprv_to_key(xprv),
        }
    }

    pub fn address(&self, coin: &Coin) -> Result<String> {
        let key = self.to_key(coin)?;
        address::address_for_key(&key, coin)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VerifyStats {
    pub written: usize,
    pub skipped: usize,
}

/// Derive an address for every secret in `input`, writing `secret,address`
/// lines in input order. Bad lines are logged and skipped; only an unreadable
/// input file aborts the batch.
pub fn verify_file(input: &Path, output: &Path, coin: &Coin) -> Result<VerifyStats> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("failed to open {}", input.display()))?,
    );
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("failed to create {}", output.display()))?,
    );

    let mut stats = VerifyStats::default();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let secret_str = line.trim();
        if secret_str.is_empty() || secret_str.starts_with('#') {
            continue;
        }

        let secret = match Secret::detect(secret_str) {
            Some(s) => s,
            None => {
                warn!("line {}: unrecognized secret format, skipping", line_number + 1);
                stats.skipped += 1;
                continue;
            }
        };

        match secret.address(coin) {
            Ok(address) => {
                writeln!(writer, "{},{}", secret_str, address)?;
                stats.written += 1;
            }
            Err(e) => {
                warn!("line {}: {}, skipping", line_number + 1, e);
                stats.skipped += 1;
            }
        }
    }

    writer.flush()?;
    Ok(stats)
}
