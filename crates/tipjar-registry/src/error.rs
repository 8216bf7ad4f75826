//! Error types for registry operations.

use thiserror::Error;
use tipjar_types::TypeError;

/// Errors that can occur during registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The external reference is empty or rejected by the reference policy.
    #[error("invalid external reference {external_ref:?}: {reason}")]
    InvalidExternalRef { external_ref: String, reason: String },

    /// The payout address does not match the asset's address grammar.
    #[error("invalid payout address: {0}")]
    InvalidAddress(#[from] TypeError),

    /// The external reference is already registered.
    #[error("external reference already registered: {external_ref}")]
    DuplicateRegistration { external_ref: String },

    /// No registration matched the external reference.
    #[error("external reference not registered: {external_ref}")]
    NotRegistered { external_ref: String },

    /// A registry lock was poisoned by a panicking writer.
    #[error("registry lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Convenience type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
