use tipjar_types::{Address, Amount};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("insufficient balance for {recipient}: requested {requested}, available {available}")]
    InsufficientBalance {
        recipient: Address,
        requested: Amount,
        available: Amount,
    },

    #[error("transaction id already recorded: {id}")]
    DuplicateTransaction { id: String },

    #[error("amount overflow while crediting {recipient}")]
    AmountOverflow { recipient: Address },

    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    #[error("invalid sequence range: from={from}, to={to}")]
    InvalidRange { from: u64, to: u64 },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("ledger lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for LedgerError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned(err.to_string())
    }
}
