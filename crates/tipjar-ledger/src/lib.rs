//! Append-only tip ledger for Tipjar.
//!
//! This crate is the heart of Tipjar. It provides:
//! - Tip and withdrawal records with hash-linked integrity
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `InMemoryLedger` implementation for tests and embedding
//! - Per-recipient and pool-wide aggregates with fine-grained locking
//! - `TipPool`, which keeps the ledger and aggregates in step
//! - Deterministic replay and consistency validation

pub mod aggregate;
pub mod error;
pub mod memory;
pub mod pool;
pub mod records;
pub mod replay;
pub mod traits;
pub mod validation;

pub use aggregate::{Aggregator, GlobalStats, RecipientStats, ReferenceStats, TopRecipient};
pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use pool::TipPool;
pub use records::{
    Digest, EntryKind, LedgerEntry, NewTip, Role, TipEvent, WithdrawalEvent, WithdrawalReceipt,
};
pub use replay::{ReplayEngine, ReplayResult};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{ConsistencyReport, ConsistencyValidator, Violation, ViolationKind};
