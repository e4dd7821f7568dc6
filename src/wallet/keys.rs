//! Key, signature and keypair types

use curve25519_dalek::Scalar;
use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Verifier, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha512;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::address::key_hash;
use super::derivation_path::DerivationPath;
use super::{WalletError, WalletResult};

// =============================================================================
// Private key
// =============================================================================

/// Extended Ed25519 private key `kL ‖ kR`.
///
/// Not `Clone`; zeroized on drop; `Debug` never prints key bytes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    bytes: [u8; 64],
}

impl PrivateKey {
    /// Wrap raw key bytes. Only the length is checked here; clamping is
    /// checked when the key is used.
    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        if bytes.len() != 64 {
            return Err(WalletError::SigningError(format!(
                "private key must be 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = Self { bytes: [0u8; 64] };
        key.bytes.copy_from_slice(bytes);
        Ok(key)
    }

    pub(crate) fn from_array(bytes: &[u8; 64]) -> Self {
        Self { bytes: *bytes }
    }

    #[cfg(test)]
    pub(crate) fn to_array(&self) -> [u8; 64] {
        self.bytes
    }

    pub fn public_key(&self) -> WalletResult<PublicKey> {
        let esk = self.expanded()?;
        Ok(PublicKey(VerifyingKey::from(&esk).to_bytes()))
    }

    fn expanded(&self) -> WalletResult<ExpandedSecretKey> {
        if self.bytes[0] & 0b0000_0111 != 0 || self.bytes[31] & 0b1000_0000 != 0 {
            return Err(WalletError::SigningError("private key is not a valid extended key".into()));
        }
        let mut kl = Zeroizing::new([0u8; 32]);
        kl.copy_from_slice(&self.bytes[..32]);
        let mut hash_prefix = Zeroizing::new([0u8; 32]);
        hash_prefix.copy_from_slice(&self.bytes[32..]);
        // ExpandedSecretKey wipes its own copy on drop
        Ok(ExpandedSecretKey {
            scalar: Scalar::from_bytes_mod_order(*kl),
            hash_prefix: *hash_prefix,
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

// =============================================================================
// Public key and signature
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub(crate) fn from_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        let array: [u8; 32] = bytes.try_into().map_err(|_| {
            WalletError::SigningError(format!("public key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(array))
    }

    pub fn from_hex(hex_str: &str) -> WalletResult<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| WalletError::SigningError(format!("public key is not hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Blake2b-224 credential hash
    pub fn key_hash(&self) -> [u8; 28] {
        key_hash(&self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        let array: [u8; 64] = bytes.try_into().map_err(|_| {
            WalletError::SigningError(format!("signature must be 64 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(array))
    }

    pub fn from_hex(hex_str: &str) -> WalletResult<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| WalletError::SigningError(format!("signature is not hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

macro_rules! hex_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                <$ty>::from_hex(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_serde!(PublicKey);
hex_serde!(Signature);

// =============================================================================
// Keypair
// =============================================================================

/// Keys derived for one path. Dropping it zeroizes the private key.
#[derive(Debug)]
pub struct Keypair {
    pub path: DerivationPath,
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
    /// Role 2 index 0 key of the same account
    pub stake_public_key: PublicKey,
    /// Base address (payment + stake credential)
    pub address: String,
}

/// Public result of a derive-and-sign call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub public_key: PublicKey,
    pub signature: Signature,
}

// =============================================================================
// Sign / verify
// =============================================================================

/// Deterministic Ed25519 signature with an extended key
pub fn sign(message: &[u8], key: &PrivateKey) -> WalletResult<Signature> {
    let esk = key.expanded()?;
    let verifying_key = VerifyingKey::from(&esk);
    let signature = raw_sign::<Sha512>(&esk, message, &verifying_key);
    Ok(Signature(signature.to_bytes()))
}

/// Standard Ed25519 verification
pub fn verify(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &signature).is_ok()
}
