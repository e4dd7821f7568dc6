//! Per-asset raw quantities

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::unit::{is_ledger_unit, GROUP_ID_LEN, LOVELACE};

/// Asset identifier (`lovelace` or `policy ‖ name` hex)
pub type AssetId = String;

/// Raw, pre-decimal amount
pub type Quantity = u128;

/// Unique `(asset, quantity)` pairs, ordered by asset identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetQuantityVector {
    entries: BTreeMap<AssetId, Quantity>,
    /// Identifiers whose true sum exceeded `Quantity::MAX`
    overflowed: BTreeSet<AssetId>,
}

impl AssetQuantityVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs; duplicate identifiers are summed
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Quantity)>,
        S: Into<AssetId>,
    {
        let mut vector = Self::new();
        for (unit, quantity) in pairs {
            vector.add(unit, quantity);
        }
        vector
    }

    /// Add to an asset's quantity, creating the entry if needed.
    ///
    /// A sum past `Quantity::MAX` is held at the maximum and the identifier
    /// is recorded as overflowed.
    pub fn add(&mut self, unit: impl Into<AssetId>, quantity: Quantity) {
        let unit = unit.into();
        let current = self.entries.get(&unit).copied().unwrap_or(0);
        match current.checked_add(quantity) {
            Some(sum) => {
                self.entries.insert(unit, sum);
            }
            None => {
                self.entries.insert(unit.clone(), Quantity::MAX);
                self.overflowed.insert(unit);
            }
        }
    }

    /// Sum another vector into this one
    pub fn merge(&mut self, other: &AssetQuantityVector) {
        for (unit, quantity) in &other.entries {
            self.add(unit.clone(), *quantity);
        }
        self.overflowed.extend(other.overflowed.iter().cloned());
    }

    /// True when the quantity held for `unit` is a capped, overflowed sum
    pub fn is_overflowed(&self, unit: &str) -> bool {
        self.overflowed.contains(unit)
    }

    pub fn overflowed(&self) -> impl Iterator<Item = &AssetId> {
        self.overflowed.iter()
    }

    pub fn get(&self, unit: &str) -> Option<Quantity> {
        self.entries.get(unit).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &Quantity)> {
        self.entries.iter()
    }

    pub fn units(&self) -> impl Iterator<Item = &AssetId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `[[unit, quantity], ...]` in identifier order
    pub fn to_pairs(&self) -> Vec<(AssetId, Quantity)> {
        self.entries.iter().map(|(u, q)| (u.clone(), *q)).collect()
    }

    /// Group into policy id -> asset name -> quantity, the ledger's value layout.
    /// Lovelace is keyed by the empty policy and empty name.
    ///
    /// Fails on an identifier that is not a ledger unit or whose quantity
    /// overflowed, so no two identifiers can land in the same slot.
    pub fn to_value_map(&self) -> Result<BTreeMap<String, BTreeMap<String, Quantity>>, String> {
        let mut value: BTreeMap<String, BTreeMap<String, Quantity>> = BTreeMap::new();
        for (unit, quantity) in &self.entries {
            if !is_ledger_unit(unit) {
                return Err(format!("'{}' is not a ledger asset unit", unit));
            }
            if self.is_overflowed(unit) {
                return Err(format!("quantity of '{}' overflowed", unit));
            }
            let (policy, name) = if unit == LOVELACE {
                (String::new(), String::new())
            } else {
                let (policy, name) = unit.split_at(GROUP_ID_LEN);
                (policy.to_string(), name.to_string())
            };
            value.entry(policy).or_default().insert(name, *quantity);
        }
        Ok(value)
    }
}

impl<S: Into<AssetId>> FromIterator<(S, Quantity)> for AssetQuantityVector {
    fn from_iter<I: IntoIterator<Item = (S, Quantity)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Sum quantities per identifier across all vectors.
///
/// An identifier missing from a vector contributes zero; the result does not
/// depend on input order.
pub fn aggregate(vectors: &[AssetQuantityVector]) -> AssetQuantityVector {
    let mut total = AssetQuantityVector::new();
    for vector in vectors {
        total.merge(vector);
    }
    total
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for AssetQuantityVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter())
    }
}

impl<'de> Deserialize<'de> for AssetQuantityVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VectorVisitor;

        impl<'de> Visitor<'de> for VectorVisitor {
            type Value = AssetQuantityVector;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of asset identifiers to quantities")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut vector = AssetQuantityVector::new();
                while let Some((unit, QuantityValue(quantity))) =
                    map.next_entry::<String, QuantityValue>()?
                {
                    vector.add(unit, quantity);
                }
                Ok(vector)
            }
        }

        deserializer.deserialize_map(VectorVisitor)
    }
}

/// A quantity read from JSON as a non-negative integer or a decimal string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityValue(pub Quantity);

impl Serialize for QuantityValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u128(self.0)
    }
}

impl<'de> Deserialize<'de> for QuantityValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl<'de> Visitor<'de> for QuantityVisitor {
            type Value = QuantityValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative integer or integer string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(QuantityValue(v as u128))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
                Ok(QuantityValue(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u128::try_from(v)
                    .map(QuantityValue)
                    .map_err(|_| E::custom("quantity must not be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.trim()
                    .parse::<u128>()
                    .map(QuantityValue)
                    .map_err(|_| E::custom(format!("invalid quantity '{}'", v)))
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}
