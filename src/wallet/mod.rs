//! Key derivation and signing
//!
//! Recovery phrase -> Icarus root key -> CIP-1852 account/role/index keys,
//! deterministic Ed25519 signatures over the extended private key, and
//! Shelley addresses for the derived keys.
//!
//! SECURITY: phrases are held as `SecretString`, every intermediate key as a
//! zeroize-on-drop type. Nothing here logs or serializes private material.

mod address;
mod bip32_ed25519;
mod derivation_path;
mod keys;
mod phrase;
mod signer;

pub use address::*;
pub use bip32_ed25519::{ExtendedPrivateKey, ExtendedPublicKey};
pub use derivation_path::*;
pub use keys::*;
pub use phrase::*;
pub use signer::*;

/// Errors raised by the signing service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// Message never includes the phrase words
    #[error("Invalid recovery phrase: {0}")]
    InvalidPhrase(String),

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signing failed: {0}")]
    SigningError(String),

    #[error("Key derivation failed: {0}")]
    Derivation(String),
}

pub type WalletResult<T> = Result<T, WalletError>;
