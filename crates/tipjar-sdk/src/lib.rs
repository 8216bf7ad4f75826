//! High-level SDK for Tipjar.
//!
//! [`TipJar`] ties the address registry and the tip pool together behind one
//! call interface. This is the main entry point for applications embedding
//! Tipjar, and the layer the HTTP server and CLI are built on.

pub mod config;
pub mod error;
pub mod snapshot;
pub mod tipjar;

pub use config::TipJarConfig;
pub use error::{ErrorKind, SdkError, SdkResult};
pub use snapshot::{LedgerSnapshot, SNAPSHOT_VERSION};
pub use tipjar::{TipJar, TipRequest};

// Re-export key types
pub use tipjar_ledger::{
    ConsistencyReport, ConsistencyValidator, GlobalStats, LedgerEntry, RecipientStats,
    ReferenceStats, Role, TipEvent, TopRecipient, Violation, ViolationKind, WithdrawalEvent,
    WithdrawalReceipt,
};
pub use tipjar_registry::{MatchBasis, RegistryEntry, Resolution};
pub use tipjar_types::{Address, AddressValidator, Amount, AssetKind};
