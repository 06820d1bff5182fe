use clap::{Parser, Subcommand, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coin {
    /// Bitcoin (P2PKH Base58Check, BIP44 coin type 0)
    Btc,
    /// Ethereum (Keccak256, BIP44 coin type 60)
    Eth,
}

impl Coin {
    pub fn derivation_path(&self, index: usize) -> String {
        match self {
            Coin::Btc => format!("m/44'/0'/0'/0/{}", index),
            Coin::Eth => format!("m/44'/60'/0'/0/{}", index),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    /// Checksummed BIP39 mnemonic
    Mnemonic,
    /// Unchecksummed phrase drawn from a user-supplied wordlist
    EarlyMnemonic,
    /// Raw 32-byte private key
    Key,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate random candidate secrets, one per line
    Generate {
        /// Number of secrets to generate
        #[arg(short, long)]
        count: usize,

        /// Output file path
        #[arg(short, long, default_value = "data/generated_secrets.txt")]
        output: String,

        /// Kind of secret to generate
        #[arg(short = 'k', long, value_enum, default_value_t = SecretKind::Mnemonic)]
        kind: SecretKind,

        /// Coin to derive addresses for
        #[arg(long, value_enum, default_value_t = Coin::Btc)]
        coin: Coin,

        /// Words per mnemonic (12 or 24)
        #[arg(short, long, default_value_t = 12)]
        words: usize,

        /// Wordlist file (required for early-mnemonic)
        #[arg(long)]
        wordlist: Option<String>,

        /// Number of parallel threads (0 = auto-detect)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
    },

    /// Derive sequential BIP44 wallets from a single mnemonic
    Derive {
        /// Mnemonic phrase (will prompt if not provided)
        #[arg(short, long)]
        mnemonic: Option<String>,

        /// Number of wallets to derive
        #[arg(short, long)]
        count: usize,

        /// First address index
        #[arg(long, default_value_t = 0)]
        start_index: usize,

        /// Coin to derive addresses for
        #[arg(long, value_enum, default_value_t = Coin::Btc)]
        coin: Coin,

        /// Output file path
        #[arg(short, long, default_value = "data/derived_wallets.json")]
        output: String,

        /// Number of parallel threads (0 = auto-detect)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
    },

    /// Derive addresses for a file of secrets (mnemonic, hex key, or WIF per line)
    Verify {
        /// Input file with one secret per line
        #[arg(short, long)]
        input: String,

        /// Output file path (secret,address lines)
        #[arg(short, long, default_value = "data/verified_addresses.txt")]
        output: String,

        /// Coin to derive addresses for
        #[arg(long, value_enum, default_value_t = Coin::Btc)]
        coin: Coin,
    },

    /// Query balances for a file of addresses
    CheckBalance {
        /// Input file with one address per line (or trailing CSV field)
        #[arg(short, long)]
        input: String,

        /// Output CSV path (address,balance lines)
        #[arg(short, long, default_value = "data/balances.csv")]
        output: String,

        /// Balance API base URL
        #[arg(long, default_value = crate::balance::DEFAULT_API_URL)]
        api_url: String,

        /// Delay between requests in milliseconds
        #[arg(long, default_value_t = 300)]
        delay_ms: u64,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 20)]
        timeout_secs: u64,

        /// Check at most this many addresses
        #[arg(long)]
        limit: Option<usize>,
    },
}
