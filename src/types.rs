//! Shared types for micropay-core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::assets::{AssetQuantityVector, QuantityValue};
use crate::error::{CoreError, ErrorCode};

// =============================================================================
// Network
// =============================================================================

/// Ledger network the keys and addresses belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Preprod,
    Preview,
}

impl Network {
    /// Network id carried in the low nibble of an address header
    pub fn network_id(&self) -> u8 {
        match self {
            Network::Mainnet => 1,
            Network::Preprod | Network::Preview => 0,
        }
    }

    pub fn address_hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "addr",
            Network::Preprod | Network::Preview => "addr_test",
        }
    }

    pub fn stake_hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "stake",
            Network::Preprod | Network::Preview => "stake_test",
        }
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Network::Mainnet)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Preprod => "preprod",
            Network::Preview => "preview",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "preprod" | "testnet" => Ok(Network::Preprod),
            "preview" => Ok(Network::Preview),
            other => Err(CoreError::config_error(format!("Unknown network '{}'", other))),
        }
    }
}

// =============================================================================
// Funds
// =============================================================================

/// Spendable output: source transaction id and output index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FundReference {
    #[serde(rename = "hash", alias = "tx_hash", alias = "txHash")]
    pub tx_id: String,
    #[serde(alias = "output_index", alias = "outputIndex")]
    pub index: u64,
}

impl FundReference {
    pub fn new(tx_id: impl Into<String>, index: u64) -> Self {
        Self {
            tx_id: tx_id.into(),
            index,
        }
    }

    /// Raw 32-byte transaction id
    pub fn tx_id_bytes(&self) -> Result<[u8; 32], String> {
        if self.tx_id.len() != 64 {
            return Err(format!(
                "transaction id must be 64 hex characters, got {}",
                self.tx_id.len()
            ));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(&self.tx_id, &mut out)
            .map_err(|e| format!("transaction id is not hex: {}", e))?;
        Ok(out)
    }
}

impl fmt::Display for FundReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

/// Unspent output as reported by the funds query service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    #[serde(alias = "hash", alias = "tx_hash")]
    pub tx_hash: String,
    #[serde(alias = "index", alias = "output_index")]
    pub output_index: u64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: AssetQuantityVector,
}

impl Utxo {
    pub fn reference(&self) -> FundReference {
        FundReference::new(self.tx_hash.clone(), self.output_index)
    }
}

/// L1 and L2 funds fetched together in one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundsSnapshot {
    #[serde(default)]
    pub funds_in_l1: Vec<Utxo>,
    #[serde(default)]
    pub funds_in_l2: Vec<Utxo>,
    #[serde(default)]
    pub total_in_l1: AssetQuantityVector,
    #[serde(default)]
    pub total_in_l2: AssetQuantityVector,
    /// Stamped when the response is read if the service does not send one
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

/// Output amounts arrive either as `{unit: qty}` or `[{unit, quantity}]`
fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AssetQuantityVector, D::Error> {
    #[derive(Deserialize)]
    struct Entry {
        unit: String,
        quantity: QuantityValue,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Map(AssetQuantityVector),
        List(Vec<Entry>),
    }

    Ok(match Amount::deserialize(deserializer)? {
        Amount::Map(vector) => vector,
        Amount::List(entries) => entries.into_iter().map(|e| (e.unit, e.quantity.0)).collect(),
    })
}

// =============================================================================
// FFI envelope
// =============================================================================

/// Error body returned across the FFI boundary: code plus generic text only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&CoreError> for ApiError {
    fn from(error: &CoreError) -> Self {
        Self {
            code: error.code,
            message: error.user_message().to_string(),
        }
    }
}

/// `{success, data, error}` response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: &CoreError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"data":null,"error":{"code":"internal","message":"Something went wrong."}}"#
                .to_string()
        })
    }
}
