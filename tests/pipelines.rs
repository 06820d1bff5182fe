//! End-to-end tests for the file-in, file-out pipelines.

use std::fs;
use std::time::Duration;

use anyhow::Result;
use tempfile::tempdir;

use wallet_auditor::{
    balance::{check_balances, extract_addresses, BalanceApi},
    cli::Coin,
    verify::verify_file,
    wordlist::{Wordlist, WORDLIST_LEN},
};

const HEX_KEY: &str = "6cd78b0d69eab1a47bfa53a52b9d8c4331e858b5d7a599270a95d9735fdb0b94";
const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

#[test]
fn verify_pipeline_preserves_order_and_skips_bad_lines() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secrets.txt");
    let output = dir.path().join("verified.txt");

    fs::write(
        &input,
        format!(
            "# candidate secrets\n\
             {}\n\
             \n\
             not-a-secret\n\
             {}\n",
            HEX_KEY, MNEMONIC
        ),
    )
    .unwrap();

    let stats = verify_file(&input, &output, &Coin::Btc).unwrap();
    assert_eq!(stats.written, 2);
    assert_eq!(stats.skipped, 1);

    let contents = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    // at most one output line per input line, input order preserved
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(HEX_KEY));
    assert!(lines[1].starts_with(MNEMONIC));
    assert!(lines[1].ends_with(",1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"));
}

#[test]
fn verify_pipeline_is_deterministic() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secrets.txt");
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");

    fs::write(&input, format!("{}\n{}\n", HEX_KEY, MNEMONIC)).unwrap();

    verify_file(&input, &first, &Coin::Btc).unwrap();
    verify_file(&input, &second, &Coin::Btc).unwrap();
    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn verify_pipeline_fails_on_missing_input() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.txt");
    let output = dir.path().join("out.txt");
    assert!(verify_file(&missing, &output, &Coin::Btc).is_err());
}

struct ZeroBalanceApi;

impl BalanceApi for ZeroBalanceApi {
    fn fetch_balance(&self, _address: &str) -> Result<u64> {
        Ok(0)
    }
}

#[test]
fn balance_pipeline_end_to_end() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("addresses.txt");
    let output = dir.path().join("balances.csv");

    fs::write(&input, "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa\n").unwrap();

    let addresses = extract_addresses(&input).unwrap();
    let stats = check_balances(&ZeroBalanceApi, &addresses, &output, Duration::ZERO, None).unwrap();
    assert_eq!(stats.checked, 1);

    let contents = fs::read_to_string(&output).unwrap();
    assert!(contents
        .lines()
        .any(|l| l == "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa,0"));
}

#[test]
fn generated_mnemonic_output_feeds_balance_checker() {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use wallet_auditor::cli::SecretKind;
    use wallet_auditor::generator::{generate_secrets_batch, MNEMONIC_HEADER};

    let dir = tempdir().unwrap();
    let secrets = dir.path().join("secrets.txt");
    let output = dir.path().join("balances.csv");

    let lines = generate_secrets_batch(
        &SecretKind::Mnemonic,
        2,
        12,
        &Coin::Btc,
        None,
        Arc::new(AtomicUsize::new(0)),
    );
    assert_eq!(lines.len(), 2);
    fs::write(&secrets, format!("{}\n{}\n", MNEMONIC_HEADER, lines.join("\n"))).unwrap();

    let addresses = extract_addresses(&secrets).unwrap();
    assert_eq!(addresses.len(), 2);
    for address in &addresses {
        assert!(address.starts_with('1'), "not an address: {}", address);
        assert!(!address.contains('\t'));
    }

    let stats = check_balances(&ZeroBalanceApi, &addresses, &output, Duration::ZERO, None).unwrap();
    assert_eq!(stats.checked, 2);
    assert_eq!(stats.failed, 0);
}

#[test]
fn wordlist_roundtrip_through_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wordlist.txt");

    let words: Vec<String> = (0..WORDLIST_LEN).map(|i| format!("word{:04}", i)).collect();
    fs::write(&path, words.join("\n")).unwrap();

    let wordlist = Wordlist::load(&path).unwrap();
    let phrase = wordlist.random_phrase(24).unwrap();
    assert_eq!(phrase.split(' ').count(), 24);
    for word in phrase.split(' ') {
        assert!(wordlist.contains(word));
    }
}

#[test]
fn truncated_wordlist_aborts_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wordlist.txt");
    fs::write(&path, "alpha\nbeta\ngamma\n").unwrap();
    assert!(Wordlist::load(&path).is_err());
}
