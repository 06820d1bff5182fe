use anyhow::{anyhow, bail, Result};
use ripemd::Ripemd160;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use tiny_hderive::bip32::ExtendedPrivKey;

use crate::cli::Coin;

// Pre-compute and cache the secp256k1 context
thread_local! {
    pub(crate) static SECP: Secp256k1<secp256k1::All> = Secp256k1::new();
}

const P2PKH_VERSION: u8 = 0x00;
const WIF_VERSION: u8 = 0x80;
const XPRV_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];

/// SHA256 -> RIPEMD160
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha256_hash = Sha256::digest(data);
    let ripemd_hash = Ripemd160::digest(&sha256_hash);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd_hash);
    out
}

fn checksum(data: &[u8]) -> [u8; 4] {
    let hash = Sha256::digest(Sha256::digest(data));
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

pub fn base58check(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + 5);
    data.push(version);
    data.extend_from_slice(payload);
    let check = checksum(&data);
    data.extend_from_slice(&check);
    bs58::encode(data).into_string()
}

/// Mainnet P2PKH address from a compressed public key.
pub fn p2pkh_address(pubkey_compressed: &[u8; 33]) -> String {
    base58check(P2PKH_VERSION, &hash160(pubkey_compressed))
}

/// Ethereum address: Keccak256 of the uncompressed pubkey (skip 0x04), last 20 bytes.
pub fn eth_address(public_key: &PublicKey) -> String {
    let pubkey_uncompressed = public_key.serialize_uncompressed();
    let keccak_hash = Keccak256::digest(&pubkey_uncompressed[1..]);
    format!("0x{}", hex::encode(&keccak_hash[12..]))
}

/// Private key to WIF (mainnet, compressed)
pub fn to_wif(key: &[u8; 32]) -> String {
    let mut data = Vec::with_capacity(38);
    data.push(WIF_VERSION);
    data.extend_from_slice(key);
    data.push(0x01); // compressed
    let check = checksum(&data);
    data.extend_from_slice(&check);
    bs58::encode(data).into_string()
}

/// Decode a mainnet WIF string back to its 32 key bytes.
pub fn wif_to_key(wif: &str) -> Result<[u8; 32]> {
    let data = bs58::decode(wif).into_vec()?;
    if data.len() < 5 {
        bail!("WIF too short");
    }
    let (body, check) = data.split_at(data.len() - 4);
    if check != checksum(body) {
        bail!("bad WIF checksum");
    }
    // 33 bytes uncompressed form, 34 with the trailing compression flag
    if body.len() != 33 && body.len() != 34 {
        bail!("unexpected WIF payload length {}", body.len());
    }
    if body[0] != WIF_VERSION {
        bail!("unexpected WIF version byte {:#04x}", body[0]);
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&body[1..33]);
    Ok(key)
}

/// Private key carried in a serialized BIP32 mainnet extended private key.
/// Layout: version(4) depth(1) fingerprint(4) child(4) chaincode(32)
/// keydata(33) checksum(4).
pub fn xprv_to_key(xprv: &str) -> Result<[u8; 32]> {
    let data = bs58::decode(xprv).into_vec()?;
    if data.len() != 82 {
        bail!("unexpected extended key length {}", data.len());
    }
    let (body, check) = data.split_at(78);
    if check != checksum(body) {
        bail!("bad extended key checksum");
    }
    if body[..4] != XPRV_VERSION {
        bail!("not a mainnet extended private key");
    }
    if body[45] != 0x00 {
        bail!("malformed extended private key payload");
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&body[46..78]);
    Ok(key)
}

/// BIP32 child key for a full derivation path.
pub fn derive_key_from_seed(seed: &[u8], path: &str) -> Result<[u8; 32]> {
    let derived = ExtendedPrivKey::derive(seed, path)
        .map_err(|e| anyhow!("HD derivation failed for {}: {:?}", path, e))?;
    Ok(derived.secret())
}

/// Address for a raw private key. Deterministic: same key, same address.
pub fn address_for_key(private_key: &[u8; 32], coin: &Coin) -> Result<String> {
    SECP.with(|secp| {
        let secret_key = SecretKey::from_slice(private_key)?;
        let public_key = PublicKey::from_secret_key(secp, &secret_key);
        Ok(match coin {
            Coin::Btc => p2pkh_address(&public_key.serialize()),
            Coin::Eth => eth_address(&public_key),
        })
    })
}
