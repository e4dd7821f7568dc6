//! Collaborators of the reconciler: asset metadata, USD prices and the funds
//! query service.
//!
//! The reconciler only sees the traits. Plain closures work for tests and
//! callers that already hold the data; the HTTP-backed types use the blocking
//! `reqwest` client built from `CoreConfig`.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::assets::{AssetId, LOVELACE};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::types::FundsSnapshot;
use crate::log_debug;

const MODULE: &str = "balances";

// =============================================================================
// Traits
// =============================================================================

/// Decimal places and display symbol per asset
pub trait AssetRegistry {
    fn decimals(&self, unit: &str) -> Option<u32>;

    fn symbol(&self, _unit: &str) -> Option<String> {
        None
    }
}

impl<F> AssetRegistry for F
where
    F: Fn(&str) -> Option<u32>,
{
    fn decimals(&self, unit: &str) -> Option<u32> {
        self(unit)
    }
}

/// USD rate per whole unit. `Ok(None)` means the asset has no known price.
pub trait PriceFeed {
    fn usd_rate(&self, unit: &str) -> CoreResult<Option<Decimal>>;
}

impl<F> PriceFeed for F
where
    F: Fn(&str) -> CoreResult<Option<Decimal>>,
{
    fn usd_rate(&self, unit: &str) -> CoreResult<Option<Decimal>> {
        self(unit)
    }
}

/// One atomic query returning both ledgers' funds for an address
pub trait FundsSource {
    fn fetch_funds(&self, address: &str) -> CoreResult<FundsSnapshot>;
}

// =============================================================================
// Static registry / prices
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub decimals: u32,
    pub symbol: Option<String>,
}

/// In-memory registry, preloaded with lovelace (ADA, 6 decimals)
#[derive(Debug, Clone)]
pub struct StaticAssetRegistry {
    assets: HashMap<AssetId, AssetInfo>,
}

impl StaticAssetRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.insert(LOVELACE, 6, "ADA");
        registry
    }

    pub fn empty() -> Self {
        Self {
            assets: HashMap::new(),
        }
    }

    pub fn insert(&mut self, unit: impl Into<AssetId>, decimals: u32, symbol: impl Into<String>) {
        self.assets.insert(
            unit.into(),
            AssetInfo {
                decimals,
                symbol: Some(symbol.into()),
            },
        );
    }

    /// Set decimals, keeping any known symbol
    pub fn set_decimals(&mut self, unit: impl Into<AssetId>, decimals: u32) {
        self.assets
            .entry(unit.into())
            .and_modify(|info| info.decimals = decimals)
            .or_insert(AssetInfo {
                decimals,
                symbol: None,
            });
    }

    pub fn with_asset(mut self, unit: impl Into<AssetId>, decimals: u32, symbol: impl Into<String>) -> Self {
        self.insert(unit, decimals, symbol);
        self
    }
}

impl Default for StaticAssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetRegistry for StaticAssetRegistry {
    fn decimals(&self, unit: &str) -> Option<u32> {
        self.assets.get(unit).map(|info| info.decimals)
    }

    fn symbol(&self, unit: &str) -> Option<String> {
        self.assets.get(unit).and_then(|info| info.symbol.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticPriceFeed {
    rates: HashMap<AssetId, Decimal>,
}

impl StaticPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: impl Into<AssetId>, usd_rate: Decimal) {
        self.rates.insert(unit.into(), usd_rate);
    }

    pub fn with_rate(mut self, unit: impl Into<AssetId>, usd_rate: Decimal) -> Self {
        self.insert(unit, usd_rate);
        self
    }
}

impl PriceFeed for StaticPriceFeed {
    fn usd_rate(&self, unit: &str) -> CoreResult<Option<Decimal>> {
        Ok(self.rates.get(unit).copied())
    }
}

// =============================================================================
// CoinGecko
// =============================================================================

/// `GET {base}/simple/price?ids={id}&vs_currencies=usd`
///
/// Units without a configured CoinGecko id have no price.
pub struct CoinGeckoPriceFeed {
    client: reqwest::blocking::Client,
    base_url: String,
    ids: HashMap<AssetId, String>,
}

impl CoinGeckoPriceFeed {
    pub fn new(config: &CoreConfig) -> CoreResult<Self> {
        let mut ids = HashMap::new();
        ids.insert(LOVELACE.to_string(), "cardano".to_string());
        Ok(Self {
            client: config.http_client()?,
            base_url: config.price_api_url.trim_end_matches('/').to_string(),
            ids,
        })
    }

    pub fn with_id(mut self, unit: impl Into<AssetId>, coingecko_id: impl Into<String>) -> Self {
        self.ids.insert(unit.into(), coingecko_id.into());
        self
    }

    fn price_url(&self, id: &str) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url,
            urlencoding::encode(id)
        )
    }
}

impl PriceFeed for CoinGeckoPriceFeed {
    fn usd_rate(&self, unit: &str) -> CoreResult<Option<Decimal>> {
        let Some(id) = self.ids.get(unit) else {
            return Ok(None);
        };

        let response = self.client.get(self.price_url(id)).send()?;
        if !response.status().is_success() {
            return Err(CoreError::network_error(format!(
                "price service returned {}",
                response.status()
            )));
        }
        let json: serde_json::Value = response.json()?;
        log_debug!(MODULE, "price fetched", id = id);
        parse_usd_rate(&json, id)
    }
}

/// Reads `{id: {usd: n}}` without going through `f64`
fn parse_usd_rate(json: &serde_json::Value, id: &str) -> CoreResult<Option<Decimal>> {
    let Some(rate) = json.get(id).and_then(|entry| entry.get("usd")) else {
        return Ok(None);
    };
    let text = match rate {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => return Err(CoreError::parse_error(format!("price for '{}' is not a number", id))),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|e| CoreError::parse_error(format!("price for '{}' is invalid: {}", id, e)))
}

// =============================================================================
// Funds query service
// =============================================================================

/// `GET {base}/funds/{address}` returning L1 and L2 funds in one response
pub struct HttpFundsSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpFundsSource {
    pub fn new(config: &CoreConfig) -> CoreResult<Self> {
        Ok(Self {
            client: config.http_client()?,
            base_url: config.funds_api_url.trim_end_matches('/').to_string(),
        })
    }

    fn funds_url(&self, address: &str) -> String {
        format!("{}/funds/{}", self.base_url, urlencoding::encode(address))
    }
}

impl FundsSource for HttpFundsSource {
    fn fetch_funds(&self, address: &str) -> CoreResult<FundsSnapshot> {
        if address.trim().is_empty() {
            return Err(CoreError::invalid_input("address is empty"));
        }
        let response = self.client.get(self.funds_url(address)).send()?;
        if !response.status().is_success() {
            return Err(CoreError::network_error(format!(
                "funds service returned {}",
                response.status()
            )));
        }
        let snapshot: FundsSnapshot = response.json()?;
        log_debug!(
            MODULE,
            "funds fetched",
            address = address,
            l1_outputs = snapshot.funds_in_l1.len(),
            l2_outputs = snapshot.funds_in_l2.len()
        );
        Ok(snapshot)
    }
}
