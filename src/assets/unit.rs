//! Asset identifier decomposition
//!
//! A unit is `policy id hex (56 chars) ‖ asset name hex`, or the bare
//! `lovelace` for the native coin. Asset names may carry a CIP-67 label
//! prefix (`0 llll cc 0`, where `cc` is a CRC-8 over the label).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a policy id in hex characters
pub const GROUP_ID_LEN: usize = 56;

/// Identifier of the native coin
pub const LOVELACE: &str = "lovelace";

/// Length of a CIP-67 label prefix in hex characters
pub const LABEL_LEN: usize = 8;

/// Longest asset name in hex characters (32 bytes)
pub const MAX_NAME_LEN: usize = 64;

/// Decomposed asset identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Policy id, or the whole identifier when it is shorter than a policy id
    pub group_id: String,
    /// Asset name; `Some("")` is the native unit of the group, `None` means
    /// the identifier had no room for a name at all
    pub sub_name: Option<String>,
}

impl Unit {
    /// CIP-67 label of the asset name, if it carries a valid one
    pub fn label(&self) -> Option<u16> {
        let name = self.sub_name.as_deref()?;
        name.get(..LABEL_LEN).and_then(from_label)
    }

    /// Asset name with any CIP-67 label stripped
    pub fn name(&self) -> Option<&str> {
        let name = self.sub_name.as_deref()?;
        match self.label() {
            Some(_) => name.get(LABEL_LEN..),
            None => Some(name),
        }
    }

    /// True for the empty-name sentinel
    pub fn is_native(&self) -> bool {
        self.sub_name.as_deref() == Some("")
    }

    pub fn is_lovelace(&self) -> bool {
        self.group_id == LOVELACE && self.sub_name.is_none()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.group_id, self.sub_name.as_deref().unwrap_or(""))
    }
}

/// True when `unit` can be placed in a ledger value: `lovelace`, or a
/// lowercase hex policy id followed by a whole-byte asset name.
pub fn is_ledger_unit(unit: &str) -> bool {
    if unit == LOVELACE {
        return true;
    }
    (GROUP_ID_LEN..=GROUP_ID_LEN + MAX_NAME_LEN).contains(&unit.len())
        && unit.len() % 2 == 0
        && unit.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Split an identifier into policy id and asset name. Never fails.
pub fn parse_unit(unit: &str) -> Unit {
    // Split on a char boundary so stray non-ASCII input cannot panic
    match unit.char_indices().nth(GROUP_ID_LEN) {
        Some((split, _)) => Unit {
            group_id: unit[..split].to_string(),
            sub_name: Some(unit[split..].to_string()),
        },
        None if unit.chars().count() == GROUP_ID_LEN => Unit {
            group_id: unit.to_string(),
            sub_name: Some(String::new()),
        },
        None => Unit {
            group_id: unit.to_string(),
            sub_name: None,
        },
    }
}

/// Encode a CIP-67 label number as its 8-hex-char prefix
pub fn to_label(label: u16) -> String {
    format!("0{:04x}{:02x}0", label, crc8(&label.to_be_bytes()))
}

/// Decode a CIP-67 label prefix, checking its checksum
pub fn from_label(prefix: &str) -> Option<u16> {
    if prefix.len() != LABEL_LEN || !prefix.starts_with('0') || !prefix.ends_with('0') {
        return None;
    }
    let number = u16::from_str_radix(prefix.get(1..5)?, 16).ok()?;
    let check = u8::from_str_radix(prefix.get(5..7)?, 16).ok()?;
    (crc8(&number.to_be_bytes()) == check).then_some(number)
}

/// Assemble a unit from a policy id, an optional hex name and an optional label
pub fn to_unit(group_id: &str, name: Option<&str>, label: Option<u16>) -> String {
    let mut unit = String::with_capacity(GROUP_ID_LEN + LABEL_LEN + 64);
    unit.push_str(group_id);
    if let Some(label) = label {
        unit.push_str(&to_label(label));
    }
    if let Some(name) = name {
        unit.push_str(name);
    }
    unit
}

/// CRC-8, polynomial 0x07, zero init
fn crc8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |mut crc, byte| {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
        crc
    })
}
