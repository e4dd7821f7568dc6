//! Unit decomposition and per-asset quantity vectors

pub mod quantity;
pub mod unit;

pub use quantity::{aggregate, AssetId, AssetQuantityVector, Quantity, QuantityValue};
pub use unit::{
    from_label, is_ledger_unit, parse_unit, to_label, to_unit, Unit, GROUP_ID_LEN, LOVELACE,
    MAX_NAME_LEN,
};
