use anyhow::{bail, Result};
use bip39::Mnemonic;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde_json;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use wallet_auditor::{
    balance::BlockstreamClient,
    cli::{Args, Coin, Command, SecretKind},
    generator, verify,
    wallet::WalletRecord,
    wordlist::Wordlist,
};

const MAX_ITEMS: usize = 100_000_000;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Generate {
            count,
            output,
            kind,
            coin,
            words,
            wordlist,
            threads,
        } => run_generate(count, &output, &kind, &coin, words, wordlist.as_deref(), threads),
        Command::Derive {
            mnemonic,
            count,
            start_index,
            coin,
            output,
            threads,
        } => run_derive(mnemonic, count, start_index, &coin, &output, threads),
        Command::Verify {
            input,
            output,
            coin,
        } => run_verify(&input, &output, &coin),
        Command::CheckBalance {
            input,
            output,
            api_url,
            delay_ms,
            timeout_secs,
            limit,
        } => run_check_balance(&input, &output, &api_url, delay_ms, timeout_secs, limit),
    }
}

fn run_generate(
    count: usize,
    output: &str,
    kind: &SecretKind,
    coin: &Coin,
    words: usize,
    wordlist_path: Option<&str>,
    threads: usize,
) -> Result<()> {
    if count == 0 {
        bail!("count must be greater than zero");
    }
    if count > MAX_ITEMS {
        bail!("Too many secrets requested. Maximum is {}", group_digits(MAX_ITEMS));
    }
    if *kind != SecretKind::Key && words != 12 && words != 24 {
        bail!("word count must be 12 or 24, got {}", words);
    }

    // A bad wordlist aborts before any output is written
    let wordlist = match (kind, wordlist_path) {
        (SecretKind::EarlyMnemonic, Some(path)) => Some(Wordlist::load(path)?),
        (SecretKind::EarlyMnemonic, None) => {
            bail!("--wordlist is required for early-mnemonic generation")
        }
        _ => None,
    };

    let num_threads = setup_thread_pool(threads)?;

    println!("\n⚡ Wallet Auditor — secret generation");
    println!("Secret kind: {:?}", kind);
    println!("Coin: {:?}", coin);
    println!("Threads: {}", num_threads);
    println!("\nGenerating {} secrets...", group_digits(count));

    let start_time = Instant::now();
    let pb = progress_bar(count as u64)?;
    let progress = Arc::new(AtomicUsize::new(0));
    let progress_handle = spawn_progress_thread(pb.clone(), progress.clone(), count, "secrets");

    let secrets_per_thread = (count + num_threads - 1) / num_threads;
    let wordlist_ref = wordlist.as_ref();

    let all_lines: Vec<String> = (0..num_threads)
        .into_par_iter()
        .flat_map(|thread_id| {
            let start_idx = thread_id * secrets_per_thread;
            let chunk = secrets_per_thread.min(count.saturating_sub(start_idx));
            if chunk == 0 {
                Vec::new()
            } else {
                generator::generate_secrets_batch(
                    kind,
                    chunk,
                    words,
                    coin,
                    wordlist_ref,
                    progress.clone(),
                )
            }
        })
        .collect();

    progress_handle.join().unwrap();
    pb.finish_with_message("Generation complete!");

    create_parent_dirs(output)?;
    let file = File::create(output)?;
    let mut writer = BufWriter::with_capacity(8 * 1024 * 1024, file);
    if *kind == SecretKind::Mnemonic {
        writeln!(writer, "{}", generator::MNEMONIC_HEADER)?;
    }
    for line in &all_lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    let total_time = start_time.elapsed();
    println!("\n✅ Generated {} secrets in {:.2}s ({:.0}/sec)",
        group_digits(all_lines.len()),
        total_time.as_secs_f64(),
        all_lines.len() as f64 / total_time.as_secs_f64());
    println!("📁 Output: {}", output);

    Ok(())
}

fn run_derive(
    mnemonic: Option<String>,
    count: usize,
    start_index: usize,
    coin: &Coin,
    output: &str,
    threads: usize,
) -> Result<()> {
    if count == 0 {
        bail!("count must be greater than zero");
    }
    if count > MAX_ITEMS {
        bail!("Too many wallets requested. Maximum is {}", group_digits(MAX_ITEMS));
    }

    // Get mnemonic
    let mnemonic_str = if let Some(m) = mnemonic {
        m
    } else {
        println!("Enter your mnemonic phrase:");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        input.trim().to_string()
    };

    println!("Parsing mnemonic and generating seed...");
    let mnemonic = Mnemonic::parse(&mnemonic_str)
        .map_err(|e| anyhow::anyhow!("Invalid mnemonic: {}", e))?;
    let seed = mnemonic.to_seed("");

    let num_threads = setup_thread_pool(threads)?;

    println!("\n⚡ Wallet Auditor — BIP44 derivation");
    println!("Coin: {:?}", coin);
    println!("Threads: {}", num_threads);
    println!("\nDeriving {} wallets from index {}...", group_digits(count), start_index);

    let start_time = Instant::now();
    let pb = progress_bar(count as u64)?;
    let progress = Arc::new(AtomicUsize::new(0));
    let progress_handle = spawn_progress_thread(pb.clone(), progress.clone(), count, "wallets");

    let wallets_per_thread = (count + num_threads - 1) / num_threads;

    let all_wallets: Vec<WalletRecord> = (0..num_threads)
        .into_par_iter()
        .flat_map(|thread_id| {
            let offset = thread_id * wallets_per_thread;
            let chunk = wallets_per_thread.min(count.saturating_sub(offset));
            if chunk == 0 {
                Vec::new()
            } else {
                generator::derive_wallets_batch(
                    &seed,
                    start_index + offset,
                    chunk,
                    coin,
                    progress.clone(),
                )
            }
        })
        .collect();

    progress_handle.join().unwrap();
    pb.finish_with_message("Derivation complete!");

    println!("\nWriting {} wallets to file...", all_wallets.len());
    create_parent_dirs(output)?;
    let file = File::create(output)?;
    let mut writer = BufWriter::with_capacity(8 * 1024 * 1024, file);

    // Write JSON array
    writer.write_all(b"[")?;
    for (i, wallet) in all_wallets.iter().enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        writer.write_all(b"\n  ")?;
        serde_json::to_writer(&mut writer, wallet)?;
    }
    writer.write_all(b"\n]")?;
    writer.flush()?;

    let total_time = start_time.elapsed();
    println!("\n✅ Derived {} wallets in {:.2}s ({:.0}/sec)",
        group_digits(all_wallets.len()),
        total_time.as_secs_f64(),
        all_wallets.len() as f64 / total_time.as_secs_f64());
    println!("📁 Output: {}", output);

    Ok(())
}

fn run_verify(input: &str, output: &str, coin: &Coin) -> Result<()> {
    println!("\n⚡ Wallet Auditor — batch verification");
    println!("Coin: {:?}", coin);
    println!("Input: {}", input);

    let start_time = Instant::now();
    create_parent_dirs(output)?;
    let stats = verify::verify_file(Path::new(input), Path::new(output), coin)?;

    println!("\n✅ Wrote {} records in {:.2}s ({} lines skipped)",
        group_digits(stats.written),
        start_time.elapsed().as_secs_f64(),
        stats.skipped);
    println!("📁 Output: {}", output);

    Ok(())
}

fn run_check_balance(
    input: &str,
    output: &str,
    api_url: &str,
    delay_ms: u64,
    timeout_secs: u64,
    limit: Option<usize>,
) -> Result<()> {
    let addresses = wallet_auditor::extract_addresses(Path::new(input))?;
    if addresses.is_empty() {
        bail!("no addresses found in {}", input);
    }

    println!("\n⚡ Wallet Auditor — balance check");
    println!("API: {}", api_url);
    println!("Checking {} unique addresses...", group_digits(addresses.len()));

    let api = BlockstreamClient::new(api_url, Duration::from_secs(timeout_secs))?;

    let start_time = Instant::now();
    create_parent_dirs(output)?;
    let stats = wallet_auditor::check_balances(
        &api,
        &addresses,
        Path::new(output),
        Duration::from_millis(delay_ms),
        limit,
    )?;

    println!("\n✅ Checked {} addresses in {:.2}s ({} lookups failed)",
        group_digits(stats.checked),
        start_time.elapsed().as_secs_f64(),
        stats.failed);
    println!("📁 Output: {}", output);

    Ok(())
}

fn setup_thread_pool(threads: usize) -> Result<usize> {
    let num_threads = if threads > 0 {
        threads
    } else {
        num_cpus::get()
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    Ok(num_threads)
}

fn progress_bar(total: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn spawn_progress_thread(
    pb: ProgressBar,
    progress: Arc<AtomicUsize>,
    total: usize,
    unit: &'static str,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut last_count = 0;
        let mut last_time = Instant::now();

        loop {
            std::thread::sleep(Duration::from_millis(100));

            let current_count = progress.load(Ordering::Relaxed);
            pb.set_position(current_count.min(total) as u64);

            let now = Instant::now();
            let time_diff = now.duration_since(last_time).as_secs_f64();

            if time_diff > 0.5 {
                let rate = (current_count - last_count) as f64 / time_diff;
                pb.set_message(format!("{:.0} {}/sec", rate, unit));
                last_count = current_count;
                last_time = now;
            }

            if current_count >= total {
                break;
            }
        }
    })
}

fn create_parent_dirs(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn group_digits(n: usize) -> String {
    n.to_string()
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect::<Vec<_>>()
        .join(",")
}
