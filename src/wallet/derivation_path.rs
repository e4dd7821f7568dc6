//! CIP-1852 derivation paths
//!
//! `m / 1852' / 1815' / account' / role / index`: purpose, coin type and
//! account are hardened, role and index are soft.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::WalletError;

/// CIP-1852 purpose
pub const PURPOSE: u32 = 1852;

/// SLIP-0044 coin type for ADA
pub const COIN_TYPE: u32 = 1815;

/// Hardened offset for BIP-32 style derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Key role under an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    External,
    Internal,
    Staking,
}

impl Role {
    pub fn index(&self) -> u32 {
        match self {
            Role::External => 0,
            Role::Internal => 1,
            Role::Staking => 2,
        }
    }

    pub fn from_index(index: u32) -> Result<Self, WalletError> {
        match index {
            0 => Ok(Role::External),
            1 => Ok(Role::Internal),
            2 => Ok(Role::Staking),
            other => Err(WalletError::InvalidPath(format!("unknown role {}", other))),
        }
    }
}

/// One path step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationComponent {
    pub index: u32,
    pub hardened: bool,
}

impl DerivationComponent {
    pub fn new(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    /// Index with the hardened bit applied
    pub fn full_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl fmt::Display for DerivationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    pub account: u32,
    pub role: Role,
    pub index: u32,
}

impl DerivationPath {
    pub fn new(account: u32, role: Role, index: u32) -> Result<Self, WalletError> {
        if account >= HARDENED || index >= HARDENED {
            return Err(WalletError::InvalidPath("index exceeds 2^31 - 1".into()));
        }
        Ok(Self { account, role, index })
    }

    /// First external address of an account
    pub fn payment(account: u32) -> Result<Self, WalletError> {
        Self::new(account, Role::External, 0)
    }

    /// Stake key of the same account (role 2, index 0)
    pub fn stake_key(&self) -> Self {
        Self {
            account: self.account,
            role: Role::Staking,
            index: 0,
        }
    }

    pub fn components(&self) -> [DerivationComponent; 5] {
        [
            DerivationComponent::new(PURPOSE, true),
            DerivationComponent::new(COIN_TYPE, true),
            DerivationComponent::new(self.account, true),
            DerivationComponent::new(self.role.index(), false),
            DerivationComponent::new(self.index, false),
        ]
    }

    pub fn parse(path: &str) -> Result<Self, WalletError> {
        let trimmed = path.trim();
        let rest = trimmed
            .strip_prefix("m/")
            .or_else(|| trimmed.strip_prefix("M/"))
            .ok_or_else(|| WalletError::InvalidPath("path must start with 'm/'".into()))?;

        let components = rest
            .split('/')
            .map(parse_component)
            .collect::<Result<Vec<_>, _>>()?;

        let &[purpose, coin, account, role, index] = components.as_slice() else {
            return Err(WalletError::InvalidPath(format!(
                "expected 5 components, got {}",
                components.len()
            )));
        };

        if purpose != DerivationComponent::new(PURPOSE, true) {
            return Err(WalletError::InvalidPath(format!("purpose must be {}'", PURPOSE)));
        }
        if coin != DerivationComponent::new(COIN_TYPE, true) {
            return Err(WalletError::InvalidPath(format!("coin type must be {}'", COIN_TYPE)));
        }
        if !account.hardened {
            return Err(WalletError::InvalidPath("account must be hardened".into()));
        }
        if role.hardened || index.hardened {
            return Err(WalletError::InvalidPath("role and index must not be hardened".into()));
        }

        Self::new(account.index, Role::from_index(role.index)?, index.index)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in self.components() {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DerivationPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn parse_component(s: &str) -> Result<DerivationComponent, WalletError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(WalletError::InvalidPath("empty path component".into()));
    }

    let (number, hardened) = match trimmed.strip_suffix(&['\'', 'h', 'H'][..]) {
        Some(number) => (number, true),
        None => (trimmed, false),
    };

    let index: u32 = number
        .parse()
        .map_err(|_| WalletError::InvalidPath(format!("invalid path component '{}'", s)))?;
    if index >= HARDENED {
        return Err(WalletError::InvalidPath(format!("path component {} is too large", index)));
    }

    Ok(DerivationComponent::new(index, hardened))
}
