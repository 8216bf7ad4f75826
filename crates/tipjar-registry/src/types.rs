//! Core registry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tipjar_types::Address;

/// A creator registration.
///
/// Entries are created once and never mutated; re-registering the same
/// reference is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Creator-facing identifier (profile or track URL).
    pub external_ref: String,
    /// Validated payout address for the configured asset.
    pub payout_address: Address,
    /// When the registration was accepted.
    pub registered_at: DateTime<Utc>,
}

/// How a reference was matched during resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchBasis {
    /// The query equals a registered reference.
    Exact,
    /// The query contains, or is contained by, a registered reference.
    Fuzzy,
}

/// The outcome of resolving a reference to a payout address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The registered reference that matched, which differs from the query on
    /// a fuzzy match.
    pub external_ref: String,
    pub payout_address: Address,
    pub basis: MatchBasis,
}

impl Resolution {
    pub fn is_exact(&self) -> bool {
        self.basis == MatchBasis::Exact
    }
}

impl From<(&RegistryEntry, MatchBasis)> for Resolution {
    fn from((entry, basis): (&RegistryEntry, MatchBasis)) -> Self {
        Self {
            external_ref: entry.external_ref.clone(),
            payout_address: entry.payout_address.clone(),
            basis,
        }
    }
}
