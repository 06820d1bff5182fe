use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WalletRecord {
    pub address: String,  // Base58Check or 0x-hex address
    pub pubkey: String,   // Compressed pubkey, hex
    #[serde(rename = "privateKey")]
    pub private_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wif: Option<String>,  // BTC only
    #[serde(rename = "derivationPath")]
    pub derivation_path: String,
}
