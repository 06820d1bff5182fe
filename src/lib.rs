pub mod address;
pub mod balance;
pub mod cli;
pub mod generator;
pub mod verify;
pub mod wallet;
pub mod wordlist;

pub use balance::{check_balances, extract_addresses, BalanceApi, BlockstreamClient};
pub use cli::{Args, Coin, Command, SecretKind};
pub use generator::{derive_wallets_batch, generate_secrets_batch};
pub use verify::{verify_file, Secret};
pub use wallet::WalletRecord;
pub use wordlist::Wordlist;
