use anyhow::{bail, Result};
use bip39::Mnemonic;
use hex;
use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, SecretKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tiny_hderive::bip32::ExtendedPrivKey;

use crate::address::{self, SECP};
use crate::cli::{Coin, SecretKind};
use crate::wallet::WalletRecord;
use crate::wordlist::Wordlist;

pub const MNEMONIC_HEADER: &str = "mnemonic\tprivate_hex\twif\taddress";

/// Raw private key from the OS CSPRNG. Rejection-samples the (astronomically
/// rare) bytes outside the secp256k1 field.
pub fn generate_private_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    loop {
        OsRng.fill_bytes(&mut key);
        if SecretKey::from_slice(&key).is_ok() {
            return key;
        }
    }
}

/// Checksummed BIP39 English mnemonic from fresh CSPRNG entropy.
pub fn generate_mnemonic(word_count: usize) -> Result<Mnemonic> {
    let entropy_len = match word_count {
        12 => 16,
        24 => 32,
        _ => bail!("word count must be 12 or 24, got {}", word_count),
    };
    let mut entropy = [0u8; 32];
    OsRng.fill_bytes(&mut entropy[..entropy_len]);
    Ok(Mnemonic::from_entropy(&entropy[..entropy_len])?)
}

/// Format one independently generated secret as an output line.
fn secret_line(kind: &SecretKind, word_count: usize, coin: &Coin, wordlist: Option<&Wordlist>) -> Result<String> {
    match kind {
        SecretKind::Key => {
            let key = generate_private_key();
            let address = address::address_for_key(&key, coin)?;
            let line = match coin {
                Coin::Btc => format!("{},{},{}", hex::encode(key), address::to_wif(&key), address),
                Coin::Eth => format!("{},{}", hex::encode(key), address),
            };
            Ok(line)
        }
        SecretKind::Mnemonic => {
            let mnemonic = generate_mnemonic(word_count)?;
            let seed = mnemonic.to_seed("");
            let key = address::derive_key_from_seed(&seed, &coin.derivation_path(0))?;
            let address = address::address_for_key(&key, coin)?;
            let wif = match coin {
                Coin::Btc => address::to_wif(&key),
                Coin::Eth => String::new(),
            };
            Ok(format!("{}\t{}\t{}\t{}", mnemonic, hex::encode(key), wif, address))
        }
        SecretKind::EarlyMnemonic => {
            let wordlist = match wordlist {
                Some(w) => w,
                None => bail!("early-mnemonic generation requires a wordlist"),
            };
            wordlist.random_phrase(word_count)
        }
    }
}

/// Generate `count` independent secrets, one output line each. Per-item
/// derivation failures are skipped; the progress counter still advances.
pub fn generate_secrets_batch(
    kind: &SecretKind,
    count: usize,
    word_count: usize,
    coin: &Coin,
    wordlist: Option<&Wordlist>,
    progress: Arc<AtomicUsize>,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(count);

    for i in 0..count {
        match secret_line(kind, word_count, coin, wordlist) {
            Ok(line) => lines.push(line),
            Err(e) => log::warn!("secret generation failed: {}", e),
        }

        if i % 1000 == 0 {
            progress.fetch_add(1000, Ordering::Relaxed);
        }
    }

    progress.fetch_add(count % 1000, Ordering::Relaxed);
    lines
}

pub fn derive_wallets_batch(
    seed: &[u8],
    start_index: usize,
    count: usize,
    coin: &Coin,
    progress: Arc<AtomicUsize>,
) -> Vec<WalletRecord> {
    match coin {
        Coin::Btc => derive_btc_batch(seed, start_index, count, progress),
        Coin::Eth => derive_eth_batch(seed, start_index, count, progress),
    }
}

#[inline]
fn derive_btc_batch(
    seed: &[u8],
    start_index: usize,
    count: usize,
    progress: Arc<AtomicUsize>,
) -> Vec<WalletRecord> {
    let mut wallets = Vec::with_capacity(count);

    SECP.with(|secp| {
        for i in 0..count {
            let index = start_index + i;
            let path = Coin::Btc.derivation_path(index);

            if let Ok(derived_key) = ExtendedPrivKey::derive(seed, path.as_str()) {
                let private_key = derived_key.secret();
                if let Ok(secret_key) = SecretKey::from_slice(&private_key) {
                    let public_key = PublicKey::from_secret_key(secp, &secret_key);
                    let pubkey_compressed = public_key.serialize();

                    wallets.push(WalletRecord {
                        address: address::p2pkh_address(&pubkey_compressed),
                        pubkey: hex::encode(pubkey_compressed),
                        private_key: hex::encode(private_key),
                        wif: Some(address::to_wif(&private_key)),
                        derivation_path: path,
                    });
                }
            }

            if i % 1000 == 0 {
                progress.fetch_add(1000, Ordering::Relaxed);
            }
        }
    });

    progress.fetch_add(count % 1000, Ordering::Relaxed);
    wallets
}

#[inline]
fn derive_eth_batch(
    seed: &[u8],
    start_index: usize,
    count: usize,
    progress: Arc<AtomicUsize>,
) -> Vec<WalletRecord> {
    let mut wallets = Vec::with_capacity(count);

    SECP.with(|secp| {
        for i in 0..count {
            let index = start_index + i;
            let path = Coin::Eth.derivation_path(index);

            if let Ok(derived_key) = ExtendedPrivKey::derive(seed, path.as_str()) {
                let private_key = derived_key.secret();
                if let Ok(secret_key) = SecretKey::from_slice(&private_key) {
                    let public_key = PublicKey::from_secret_key(secp, &secret_key);

                    wallets.push(WalletRecord {
                        address: address::eth_address(&public_key),
                        pubkey: hex::encode(public_key.serialize()),
                        private_key: hex::encode(private_key),
                        wif: None,
                        derivation_path: path,
                    });
                }
            }

            if i % 1000 == 0 {
                progress.fetch_add(1000, Ordering::Relaxed);
            }
        }
    });

    progress.fetch_add(count % 1000, Ordering::Relaxed);
    wallets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wordlist::WORDLIST_LEN;

    #[test]
    fn generated_mnemonic_parses_and_has_requested_length() {
        let mnemonic = generate_mnemonic(12).unwrap();
        let phrase = mnemonic.to_string();
        assert_eq!(phrase.split(' ').count(), 12);
        assert!(Mnemonic::parse(&phrase).is_ok());

        let long = generate_mnemonic(24).unwrap();
        assert_eq!(long.to_string().split(' ').count(), 24);
    }

    #[test]
    fn rejects_unsupported_word_count() {
        assert!(generate_mnemonic(15).is_err());
    }

    #[test]
    fn generated_keys_are_valid_and_distinct() {
        let a = generate_private_key();
        let b = generate_private_key();
        assert_ne!(a, b);
        assert!(SecretKey::from_slice(&a).is_ok());
    }

    #[test]
    fn early_mnemonic_batch_uses_wordlist_members() {
        let words = (0..WORDLIST_LEN).map(|i| format!("w{:04}", i)).collect();
        let wordlist = Wordlist::from_words(words).unwrap();
        let progress = Arc::new(AtomicUsize::new(0));

        let lines = generate_secrets_batch(
            &SecretKind::EarlyMnemonic,
            5,
            12,
            &Coin::Btc,
            Some(&wordlist),
            progress,
        );
        assert_eq!(lines.len(), 5);
        for line in lines {
            for word in line.split(' ') {
                assert!(wordlist.contains(word));
            }
        }
    }

    #[test]
    fn key_batch_lines_contain_key_and_address() {
        let progress = Arc::new(AtomicUsize::new(0));
        let lines =
            generate_secrets_batch(&SecretKind::Key, 3, 12, &Coin::Btc, None, progress.clone());
        assert_eq!(lines.len(), 3);
        assert!(progress.load(Ordering::Relaxed) >= 3);
        for line in lines {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 3);
            assert_eq!(fields[0].len(), 64);
            assert!(fields[2].starts_with('1'));
        }
    }

    #[test]
    fn derive_batch_is_reproducible() {
        let mnemonic = Mnemonic::parse(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
        )
        .unwrap();
        let seed = mnemonic.to_seed("");

        let first = derive_wallets_batch(&seed, 0, 4, &Coin::Btc, Arc::new(AtomicUsize::new(0)));
        let second = derive_wallets_batch(&seed, 0, 4, &Coin::Btc, Arc::new(AtomicUsize::new(0)));
        assert_eq!(first.len(), 4);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.address, b.address);
            assert_eq!(a.derivation_path, b.derivation_path);
        }
        assert_eq!(first[0].address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
    }
}
