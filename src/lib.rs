//! micropay core library
//!
//! Fund-authorization core for a two-ledger (L1 + L2) micropayment wallet.
//!
//! # Architecture
//!
//! This crate provides:
//! - **codec**: schema-directed Plutus data encoding (canonical CBOR) and decoding
//! - **assets**: asset unit parsing, CIP-67 labels, quantity vectors
//! - **authorization**: spend-authorization messages and settlement envelopes
//! - **wallet**: recovery phrases, CIP-1852 key derivation, Ed25519 signing, addresses
//! - **balances**: L1/L2 balance reconciliation with decimals and USD prices
//! - **ffi**: C-ABI exports for the mobile app
//!
//! # FFI Usage
//!
//! All public FFI functions are in the `ffi` module and follow this pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `micropay_free_string`)
//!
//! # Security
//!
//! Recovery phrases are held as `secrecy::SecretString`. Private keys, chain
//! codes and entropy are zeroized when dropped, on success and error paths
//! alike. Nothing logs or serializes private key material.
//!
//! # Example
//!
//! ```rust,ignore
//! use micropay_core::assets::AssetQuantityVector;
//! use micropay_core::authorization::build_spend_authorization;
//! use micropay_core::types::FundReference;
//!
//! let fund = FundReference::new(tx_id_hex, 0);
//! let amount = AssetQuantityVector::from_pairs([("lovelace", 2_000_000)]);
//! let message = build_spend_authorization(&fund, &amount, &[payment_key_hash])?;
//! println!("{}", message.to_hex());
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod codec;
pub mod assets;
pub mod authorization;
pub mod wallet;
pub mod balances;
pub mod utils;
pub mod ffi;

// Re-export key types for convenience
pub use error::{CoreError, CoreResult, ErrorCode};
pub use types::*;
pub use config::CoreConfig;

pub use codec::{decode, encode, EncodedValue, PlutusData, Shape, Value};
pub use assets::{aggregate, parse_unit, AssetQuantityVector, Unit};
pub use authorization::{authorize_spend, build_spend_authorization, SettlementEnvelope};
pub use wallet::{sign, validate_phrase, verify, DerivationPath, SigningService};
pub use balances::{reconcile, reconcile_funds, BalanceSnapshot};

pub use ffi::{
    micropay_authorize_spend,
    micropay_build_spend_authorization,
    micropay_decode_data,
    micropay_encode_data,
    micropay_free_string,
    micropay_parse_unit,
    micropay_reconcile,
    micropay_validate_phrase,
};
