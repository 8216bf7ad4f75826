//! Address grammars for the assets Tipjar can book.
//!
//! Each [`AssetKind`] knows the surface syntax of its payout addresses:
//!
//! - **Bitcoin**: base58 `1…`/`3…` (26-35 chars total) or lower-case bech32
//!   `bc1`/`tb1`/`bcrt1` with 39-59 trailing `[a-z0-9]` characters
//! - **Stacks**: `S` + version (`P`, `T`, `M`, `N`) + c32 body, 28-41 chars
//! - **Ethereum**: `0x` + 40 hex digits
//! - **Opaque**: anything non-empty without whitespace
//!
//! Only syntax is checked. Checksums and chain state belong to the wallet
//! collaborator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TypeError;

/// Validates the address grammar of one asset.
pub trait AddressValidator: Send + Sync {
    /// Human-readable asset name used in error messages.
    fn asset_name(&self) -> &str;

    /// Validate `raw` and return it as an [`Address`].
    fn validate(&self, raw: &str) -> Result<Address, TypeError>;
}

/// Built-in asset grammars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Bitcoin,
    /// STX and sBTC both pay out to Stacks principals.
    #[default]
    Stacks,
    Ethereum,
    Opaque,
}

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const C32_ALPHABET: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const BECH32_PREFIXES: &[&str] = &["bcrt1", "bc1", "tb1"];
const STACKS_VERSIONS: &[char] = &['P', 'T', 'M', 'N'];

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Bitcoin,
        AssetKind::Stacks,
        AssetKind::Ethereum,
        AssetKind::Opaque,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Stacks => "stacks",
            Self::Ethereum => "ethereum",
            Self::Opaque => "opaque",
        }
    }

    fn invalid(&self, raw: &str, reason: impl Into<String>) -> TypeError {
        TypeError::InvalidAddress {
            asset: self.name().to_string(),
            address: raw.to_string(),
            reason: reason.into(),
        }
    }

    fn check_bitcoin(&self, raw: &str) -> Result<(), TypeError> {
        if let Some(prefix) = BECH32_PREFIXES.iter().find(|p| raw.starts_with(**p)) {
            let data = &raw[prefix.len()..];
            if !(39..=59).contains(&data.len()) {
                return Err(self.invalid(raw, "bech32 data part must be 39-59 characters"));
            }
            if !data
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            {
                return Err(self.invalid(raw, "bech32 data part must be lower-case alphanumeric"));
            }
            return Ok(());
        }

        if raw.starts_with('1') || raw.starts_with('3') {
            let rest = &raw[1..];
            if !(25..=34).contains(&rest.len()) {
                return Err(self.invalid(raw, "base58 address must be 26-35 characters"));
            }
            if let Some(bad) = rest.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
                return Err(self.invalid(raw, format!("forbidden base58 character: {bad:?}")));
            }
            return Ok(());
        }

        Err(self.invalid(raw, "expected a 1, 3, bc1, tb1, or bcrt1 prefix"))
    }

    fn check_stacks(&self, raw: &str) -> Result<(), TypeError> {
        let mut chars = raw.chars();
        if chars.next() != Some('S') {
            return Err(self.invalid(raw, "must start with 'S'"));
        }
        match chars.next() {
            Some(v) if STACKS_VERSIONS.contains(&v) => {}
            _ => return Err(self.invalid(raw, "version must be one of P, T, M, N")),
        }
        if !(28..=41).contains(&raw.len()) {
            return Err(self.invalid(raw, "must be 28-41 characters"));
        }
        if let Some(bad) = chars.find(|c| !C32_ALPHABET.contains(*c)) {
            return Err(self.invalid(raw, format!("forbidden c32 character: {bad:?}")));
        }
        Ok(())
    }

    fn check_ethereum(&self, raw: &str) -> Result<(), TypeError> {
        let Some(hex) = raw.strip_prefix("0x") else {
            return Err(self.invalid(raw, "must start with 0x"));
        };
        if hex.len() != 40 {
            return Err(self.invalid(raw, "must carry exactly 40 hex digits"));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.invalid(raw, "must be hexadecimal"));
        }
        Ok(())
    }
}

impl AddressValidator for AssetKind {
    fn asset_name(&self) -> &str {
        self.name()
    }

    fn validate(&self, raw: &str) -> Result<Address, TypeError> {
        // The opaque rules apply to every asset.
        let address = Address::parse(raw)?;
        match self {
            Self::Bitcoin => self.check_bitcoin(raw)?,
            Self::Stacks => self.check_stacks(raw)?,
            Self::Ethereum => self.check_ethereum(raw)?,
            Self::Opaque => {}
        }
        Ok(address)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitcoin" | "btc" => Ok(Self::Bitcoin),
            "stacks" | "stx" | "sbtc" => Ok(Self::Stacks),
            "ethereum" | "eth" => Ok(Self::Ethereum),
            "opaque" | "any" => Ok(Self::Opaque),
            other => Err(TypeError::UnknownAsset(other.to_string())),
        }
    }
}
