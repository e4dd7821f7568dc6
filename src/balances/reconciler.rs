//! Dual-ledger balance reconciliation
//!
//! L1 and L2 totals are summed per asset, scaled by the asset's decimals and
//! priced in USD. Assets with missing metadata stay in the snapshot with the
//! affected fields empty; each gap is reported as a partial-data note instead
//! of failing the whole snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::sources::{AssetRegistry, PriceFeed};
use crate::assets::{aggregate, AssetId, AssetQuantityVector, Quantity};
use crate::error::ErrorCode;
use crate::types::{FundsSnapshot, Utxo};
use crate::log_warn;

const MODULE: &str = "balances";

// rust_decimal supports at most 28 fractional digits
const MAX_DECIMALS: u32 = 28;

// =============================================================================
// Types
// =============================================================================

/// One asset across both ledgers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub unit: AssetId,
    pub symbol: Option<String>,
    pub l1_raw: Quantity,
    pub l2_raw: Quantity,
    /// `l1_raw + l2_raw`
    pub raw: Quantity,
    pub decimals: Option<u32>,
    /// `raw / 10^decimals`
    pub display: Option<Decimal>,
    pub usd_value: Option<Decimal>,
}

/// Why an asset is missing its display or USD value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum PartialReason {
    UnknownDecimals,
    UnsupportedDecimals(u32),
    UnknownPrice,
    PriceUnavailable(String),
    Overflow,
}

/// Non-fatal gap in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialData {
    pub code: ErrorCode,
    pub unit: AssetId,
    #[serde(flatten)]
    pub reason: PartialReason,
}

impl PartialData {
    fn new(unit: &str, reason: PartialReason) -> Self {
        Self {
            code: ErrorCode::PartialData,
            unit: unit.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Every asset either ledger reports, ordered by unit
    pub assets: Vec<AssetBalance>,
    /// Sum of the known USD values only
    pub total_usd: Decimal,
    pub partial: Vec<PartialData>,
    pub as_of: DateTime<Utc>,
}

impl BalanceSnapshot {
    pub fn is_complete(&self) -> bool {
        self.partial.is_empty()
    }

    pub fn asset(&self, unit: &str) -> Option<&AssetBalance> {
        self.assets.iter().find(|a| a.unit == unit)
    }

    /// Combined raw quantities, as reported by the ledgers
    pub fn totals(&self) -> AssetQuantityVector {
        self.assets.iter().map(|a| (a.unit.clone(), a.raw)).collect()
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Merge one L1/L2 pair into a priced snapshot stamped with the current time.
///
/// Both totals must come from the same fetch; see `reconcile_funds`.
pub fn reconcile<R, P>(
    l1: &AssetQuantityVector,
    l2: &AssetQuantityVector,
    registry: &R,
    prices: &P,
) -> BalanceSnapshot
where
    R: AssetRegistry + ?Sized,
    P: PriceFeed + ?Sized,
{
    reconcile_at(l1, l2, registry, prices, Utc::now())
}

/// Reconcile a snapshot returned by one funds query. `as_of` is the fetch time.
///
/// A ledger whose totals are absent is summed from its outputs.
pub fn reconcile_funds<R, P>(funds: &FundsSnapshot, registry: &R, prices: &P) -> BalanceSnapshot
where
    R: AssetRegistry + ?Sized,
    P: PriceFeed + ?Sized,
{
    let l1 = ledger_totals(&funds.total_in_l1, &funds.funds_in_l1);
    let l2 = ledger_totals(&funds.total_in_l2, &funds.funds_in_l2);
    reconcile_at(&l1, &l2, registry, prices, funds.fetched_at)
}

fn ledger_totals(total: &AssetQuantityVector, outputs: &[Utxo]) -> AssetQuantityVector {
    if !total.is_empty() || outputs.is_empty() {
        return total.clone();
    }
    let amounts: Vec<AssetQuantityVector> = outputs.iter().map(|u| u.amount.clone()).collect();
    aggregate(&amounts)
}

fn reconcile_at<R, P>(
    l1: &AssetQuantityVector,
    l2: &AssetQuantityVector,
    registry: &R,
    prices: &P,
    as_of: DateTime<Utc>,
) -> BalanceSnapshot
where
    R: AssetRegistry + ?Sized,
    P: PriceFeed + ?Sized,
{
    let combined = aggregate(&[l1.clone(), l2.clone()]);
    let mut assets = Vec::with_capacity(combined.len());
    let mut partial = Vec::new();
    let mut total_usd = Decimal::ZERO;

    for (unit, &raw) in combined.iter() {
        let decimals = registry.decimals(unit);
        let mut balance = AssetBalance {
            unit: unit.clone(),
            symbol: registry.symbol(unit),
            l1_raw: l1.get(unit).unwrap_or(0),
            l2_raw: l2.get(unit).unwrap_or(0),
            raw,
            decimals,
            display: None,
            usd_value: None,
        };

        // a capped sum is not the real balance, so it is never priced
        if combined.is_overflowed(unit) {
            partial.push(PartialData::new(unit, PartialReason::Overflow));
            assets.push(balance);
            continue;
        }

        match price_balance(&mut balance, prices) {
            Ok(()) => {
                if let Some(usd) = balance.usd_value {
                    match total_usd.checked_add(usd) {
                        Some(sum) => total_usd = sum,
                        None => {
                            balance.usd_value = None;
                            partial.push(PartialData::new(unit, PartialReason::Overflow));
                        }
                    }
                }
            }
            Err(reason) => partial.push(PartialData::new(unit, reason)),
        }
        assets.push(balance);
    }

    for note in &partial {
        log_warn!(MODULE, "partial balance data", unit = note.unit, reason = format!("{:?}", note.reason));
    }

    BalanceSnapshot {
        assets,
        total_usd,
        partial,
        as_of,
    }
}

/// Fill `display` and `usd_value`; the error names the first missing piece
fn price_balance<P>(balance: &mut AssetBalance, prices: &P) -> Result<(), PartialReason>
where
    P: PriceFeed + ?Sized,
{
    let decimals = balance.decimals.ok_or(PartialReason::UnknownDecimals)?;
    if decimals > MAX_DECIMALS {
        return Err(PartialReason::UnsupportedDecimals(decimals));
    }
    let raw = i128::try_from(balance.raw).map_err(|_| PartialReason::Overflow)?;
    let display = Decimal::try_from_i128_with_scale(raw, decimals)
        .map_err(|_| PartialReason::Overflow)?
        .normalize();
    balance.display = Some(display);

    let rate = prices
        .usd_rate(&balance.unit)
        .map_err(|e| PartialReason::PriceUnavailable(e.user_message().to_string()))?
        .ok_or(PartialReason::UnknownPrice)?;
    let usd = display.checked_mul(rate).ok_or(PartialReason::Overflow)?;
    balance.usd_value = Some(usd.normalize());
    Ok(())
}
