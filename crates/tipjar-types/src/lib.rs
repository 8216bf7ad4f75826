//! Foundation types for Tipjar.
//!
//! This crate provides the value, identity, and address-grammar types shared
//! by every other Tipjar crate.
//!
//! # Key Types
//!
//! - [`Amount`] - Integer count of an asset's smallest indivisible unit
//! - [`Address`] - Opaque payout or sender address
//! - [`TipId`] / [`WithdrawalId`] - Ledger entry identifiers
//! - [`IdGenerator`] - Process-unique identifier source
//! - [`AssetKind`] - Built-in address grammars behind [`AddressValidator`]

pub mod address;
pub mod amount;
pub mod asset;
pub mod error;
pub mod id;

pub use address::Address;
pub use amount::Amount;
pub use asset::{AddressValidator, AssetKind};
pub use error::TypeError;
pub use id::{IdGenerator, TipId, WithdrawalId};
