//! Address registry for Tipjar.
//!
//! The registry maps a creator-facing reference (a SoundCloud profile or track
//! URL in practice) to the payout address tips for that creator should go to.
//!
//! # Architecture
//!
//! - **Entries** are write-once: a reference can be registered exactly once
//!   and is never updated or removed.
//! - **Payout addresses** must pass the configured asset grammar
//!   ([`tipjar_types::AssetKind`]) before they are stored.
//! - **Reference policy** restricts which references are accepted, e.g. only
//!   `https://soundcloud.com/` URLs.
//! - **Resolution** is exact first. A fuzzy fallback (substring containment in
//!   either direction) is available but always reported as
//!   [`MatchBasis::Fuzzy`]; value-moving paths use
//!   [`RegistryStore::resolve_exact`].
//!
//! # Modules
//!
//! - [`error`] - Error types for registry operations
//! - [`types`] - [`RegistryEntry`], [`Resolution`], [`MatchBasis`]
//! - [`traits`] - The [`RegistryStore`] trait defining the storage interface
//! - [`policy`] - External reference validation
//! - [`memory`] - In-memory [`InMemoryRegistry`]

pub mod error;
pub mod memory;
pub mod policy;
pub mod traits;
pub mod types;

pub use error::{RegistryError, Result};
pub use memory::InMemoryRegistry;
pub use policy::RefPolicy;
pub use traits::RegistryStore;
pub use types::{MatchBasis, RegistryEntry, Resolution};
