//! In-memory registry for embedding and tests.
//!
//! [`InMemoryRegistry`] keeps registrations in a `Vec` (registration order)
//! with a `HashMap` index, both behind one `RwLock`. Data is lost when the
//! registry is dropped; use an export snapshot to carry it across processes.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tipjar_types::{AddressValidator, AssetKind};

use crate::error::{RegistryError, Result};
use crate::policy::RefPolicy;
use crate::traits::RegistryStore;
use crate::types::RegistryEntry;

/// An in-memory implementation of [`RegistryStore`].
pub struct InMemoryRegistry {
    validator: Box<dyn AddressValidator>,
    policy: RefPolicy,
    fuzzy: bool,
    state: RwLock<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    entries: Vec<RegistryEntry>,
    by_ref: HashMap<String, usize>,
}

impl InMemoryRegistry {
    /// Create an empty registry validating payout addresses with `validator`.
    ///
    /// Any non-empty reference is accepted and fuzzy resolution is enabled.
    pub fn new(validator: impl AddressValidator + 'static) -> Self {
        Self {
            validator: Box::new(validator),
            policy: RefPolicy::any(),
            fuzzy: true,
            state: RwLock::new(RegistryState::default()),
        }
    }

    pub fn with_policy(mut self, policy: RefPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable the fuzzy fallback in [`RegistryStore::resolve`].
    pub fn with_fuzzy_resolution(mut self, enabled: bool) -> Self {
        self.fuzzy = enabled;
        self
    }

    pub fn policy(&self) -> &RefPolicy {
        &self.policy
    }

    pub fn asset_name(&self) -> &str {
        self.validator.asset_name()
    }

    fn insert(&self, entry: RegistryEntry) -> Result<RegistryEntry> {
        let mut state = self
            .state
            .write()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;

        if state.by_ref.contains_key(&entry.external_ref) {
            return Err(RegistryError::DuplicateRegistration {
                external_ref: entry.external_ref,
            });
        }

        let index = state.entries.len();
        state.by_ref.insert(entry.external_ref.clone(), index);
        state.entries.push(entry.clone());

        tracing::debug!(
            external_ref = %entry.external_ref,
            payout_address = %entry.payout_address,
            "creator registered"
        );
        Ok(entry)
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new(AssetKind::default())
    }
}

impl std::fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("asset", &self.validator.asset_name())
            .field("policy", &self.policy)
            .field("fuzzy", &self.fuzzy)
            .finish_non_exhaustive()
    }
}

impl RegistryStore for InMemoryRegistry {
    fn register(&self, external_ref: &str, payout_address: &str) -> Result<RegistryEntry> {
        // A taken reference is a duplicate whatever the payload.
        if self.lookup(external_ref)?.is_some() {
            return Err(RegistryError::DuplicateRegistration {
                external_ref: external_ref.to_string(),
            });
        }
        self.policy.validate(external_ref)?;
        let payout_address = self.validator.validate(payout_address)?;

        self.insert(RegistryEntry {
            external_ref: external_ref.to_string(),
            payout_address,
            registered_at: Utc::now(),
        })
    }

    fn restore(&self, entry: &RegistryEntry) -> Result<()> {
        self.policy.validate(&entry.external_ref)?;
        self.validator.validate(entry.payout_address.as_str())?;
        self.insert(entry.clone()).map(|_| ())
    }

    fn lookup(&self, external_ref: &str) -> Result<Option<RegistryEntry>> {
        let state = self
            .state
            .read()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        Ok(state
            .by_ref
            .get(external_ref)
            .and_then(|index| state.entries.get(*index))
            .cloned())
    }

    fn find_fuzzy(&self, query: &str) -> Result<Option<RegistryEntry>> {
        if !self.fuzzy || query.is_empty() {
            return Ok(None);
        }
        let state = self
            .state
            .read()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        Ok(state
            .entries
            .iter()
            .find(|entry| {
                query.contains(entry.external_ref.as_str())
                    || entry.external_ref.contains(query)
            })
            .cloned())
    }

    fn entries(&self) -> Result<Vec<RegistryEntry>> {
        let state = self
            .state
            .read()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        Ok(state.entries.clone())
    }

    fn len(&self) -> Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        Ok(state.entries.len())
    }
}
