// Shelley addresses
// Header nibble: 0 = base (key/key), 6 = enterprise (key), 14 = reward (key)
// Low nibble is the network id

use bech32::{self, FromBase32, ToBase32, Variant};
use blake2::digest::consts::U28;
use blake2::{Blake2b, Digest};
use serde::Serialize;

use super::{WalletError, WalletResult};
use crate::types::Network;

const BASE_KEY_KEY: u8 = 0b0000;
const ENTERPRISE_KEY: u8 = 0b0110;
const REWARD_KEY: u8 = 0b1110;

/// Blake2b-224 of a public key
pub fn key_hash(public_key: &[u8]) -> [u8; 28] {
    let mut hasher = Blake2b::<U28>::new();
    hasher.update(public_key);
    let mut out = [0u8; 28];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Payment + stake credential address (`addr1q…` on mainnet)
pub fn base_address(network: Network, payment_hash: &[u8; 28], stake_hash: &[u8; 28]) -> WalletResult<String> {
    let mut bytes = Vec::with_capacity(57);
    bytes.push(header(BASE_KEY_KEY, network));
    bytes.extend_from_slice(payment_hash);
    bytes.extend_from_slice(stake_hash);
    encode(network.address_hrp(), &bytes)
}

/// Payment credential only (`addr1v…` on mainnet)
pub fn enterprise_address(network: Network, payment_hash: &[u8; 28]) -> WalletResult<String> {
    let mut bytes = Vec::with_capacity(29);
    bytes.push(header(ENTERPRISE_KEY, network));
    bytes.extend_from_slice(payment_hash);
    encode(network.address_hrp(), &bytes)
}

/// Stake credential address (`stake1u…` on mainnet)
pub fn reward_address(network: Network, stake_hash: &[u8; 28]) -> WalletResult<String> {
    let mut bytes = Vec::with_capacity(29);
    bytes.push(header(REWARD_KEY, network));
    bytes.extend_from_slice(stake_hash);
    encode(network.stake_hrp(), &bytes)
}

/// Key hashes carried by a base or enterprise address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressKeyHashes {
    pub network_id: u8,
    #[serde(with = "hex_28")]
    pub payment: [u8; 28],
    #[serde(with = "hex_28_opt")]
    pub stake: Option<[u8; 28]>,
}

/// Decode a bech32 payment address into its key hashes.
///
/// Script credentials, pointer and Byron addresses are rejected.
pub fn address_key_hashes(address: &str) -> WalletResult<AddressKeyHashes> {
    let (hrp, data, variant) = bech32::decode(address)
        .map_err(|e| WalletError::InvalidAddress(format!("not bech32: {}", e)))?;
    if variant != Variant::Bech32 {
        return Err(WalletError::InvalidAddress("bech32m is not used for addresses".into()));
    }
    if hrp != "addr" && hrp != "addr_test" {
        return Err(WalletError::InvalidAddress(format!("unexpected prefix '{}'", hrp)));
    }
    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| WalletError::InvalidAddress(format!("bad payload: {}", e)))?;

    let (&head, body) = bytes
        .split_first()
        .ok_or_else(|| WalletError::InvalidAddress("empty payload".into()))?;
    let kind = head >> 4;
    let network_id = head & 0x0f;
    if (network_id == 1) != (hrp == "addr") {
        return Err(WalletError::InvalidAddress("prefix does not match network id".into()));
    }

    let hash_at = |offset: usize| -> [u8; 28] {
        let mut out = [0u8; 28];
        out.copy_from_slice(&body[offset..offset + 28]);
        out
    };

    match (kind, body.len()) {
        (BASE_KEY_KEY, 56) => Ok(AddressKeyHashes {
            network_id,
            payment: hash_at(0),
            stake: Some(hash_at(28)),
        }),
        (ENTERPRISE_KEY, 28) => Ok(AddressKeyHashes {
            network_id,
            payment: hash_at(0),
            stake: None,
        }),
        (BASE_KEY_KEY | ENTERPRISE_KEY, len) => Err(WalletError::InvalidAddress(format!(
            "unexpected payload length {}",
            len
        ))),
        (other, _) => Err(WalletError::InvalidAddress(format!(
            "address type {} is not a key-hash payment address",
            other
        ))),
    }
}

fn header(kind: u8, network: Network) -> u8 {
    (kind << 4) | network.network_id()
}

fn encode(hrp: &str, bytes: &[u8]) -> WalletResult<String> {
    bech32::encode(hrp, bytes.to_base32(), Variant::Bech32)
        .map_err(|e| WalletError::InvalidAddress(format!("Bech32 encoding failed: {}", e)))
}

mod hex_28 {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8; 28], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }
}

mod hex_28_opt {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &Option<[u8; 28]>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&hex::encode(b)),
            None => serializer.serialize_none(),
        }
    }
}
