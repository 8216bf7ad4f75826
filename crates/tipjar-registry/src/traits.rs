//! The [`RegistryStore`] trait defining the registry storage interface.
//!
//! Any backend (in-memory, browser storage bridge, database) implements this
//! trait to provide creator registration for Tipjar.

use tipjar_types::Address;

use crate::error::{RegistryError, Result};
use crate::types::{MatchBasis, RegistryEntry, Resolution};

/// Storage backend for creator registrations.
///
/// Implementations must be thread-safe (`Send + Sync`) and apply each
/// registration atomically: either the entry is stored in full or nothing
/// changes.
pub trait RegistryStore: Send + Sync {
    /// Register a reference with its payout address.
    ///
    /// Fails with `DuplicateRegistration` whenever the reference is taken,
    /// whatever the payload. Otherwise fails with `InvalidExternalRef` or
    /// `InvalidAddress`. No state changes on failure.
    fn register(&self, external_ref: &str, payout_address: &str) -> Result<RegistryEntry>;

    /// Re-insert a previously exported entry, keeping its timestamp.
    ///
    /// The same validation as [`register`](Self::register) applies.
    fn restore(&self, entry: &RegistryEntry) -> Result<()>;

    /// Exact lookup. Returns `Ok(None)` if the reference is not registered.
    fn lookup(&self, external_ref: &str) -> Result<Option<RegistryEntry>>;

    /// Secondary lookup by substring containment in either direction.
    ///
    /// Returns the earliest registration that matches, or `Ok(None)`.
    /// Backends with fuzzy resolution disabled always return `Ok(None)`.
    fn find_fuzzy(&self, query: &str) -> Result<Option<RegistryEntry>>;

    /// All registrations in registration order.
    fn entries(&self) -> Result<Vec<RegistryEntry>>;

    /// Resolve a reference to its payout address without any fallback.
    fn resolve_exact(&self, external_ref: &str) -> Result<Address> {
        self.lookup(external_ref)?
            .map(|entry| entry.payout_address)
            .ok_or_else(|| RegistryError::NotRegistered {
                external_ref: external_ref.to_string(),
            })
    }

    /// Resolve a reference, trying an exact match before the fuzzy fallback.
    ///
    /// The returned [`Resolution`] always states which strategy matched.
    fn resolve(&self, external_ref: &str) -> Result<Resolution> {
        if let Some(entry) = self.lookup(external_ref)? {
            return Ok(Resolution::from((&entry, MatchBasis::Exact)));
        }
        if let Some(entry) = self.find_fuzzy(external_ref)? {
            tracing::debug!(
                query = external_ref,
                matched = %entry.external_ref,
                "reference resolved by fuzzy match"
            );
            return Ok(Resolution::from((&entry, MatchBasis::Fuzzy)));
        }
        Err(RegistryError::NotRegistered {
            external_ref: external_ref.to_string(),
        })
    }

    /// Returns `true` if any registration pays out to `address`.
    fn is_payout_address(&self, address: &str) -> Result<bool> {
        Ok(self
            .entries()?
            .iter()
            .any(|entry| entry.payout_address.as_str() == address))
    }

    /// Number of registrations.
    fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
