use serde::{Deserialize, Serialize};
use thiserror::Error;
use tipjar_ledger::LedgerError;
use tipjar_registry::RegistryError;
use tipjar_types::TypeError;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("invalid address: {0}")]
    Address(#[from] TypeError),

    #[error("invalid transaction id: {0}")]
    TransactionId(TypeError),

    #[error("snapshot rejected: {0}")]
    Snapshot(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;

/// Flat classification of an [`SdkError`] for presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAmount,
    InvalidAddress,
    InvalidExternalRef,
    InvalidTransactionId,
    DuplicateRegistration,
    DuplicateTransaction,
    NotRegistered,
    InsufficientBalance,
    AmountOverflow,
    Integrity,
    Serialization,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidAddress => "invalid_address",
            Self::InvalidExternalRef => "invalid_external_ref",
            Self::InvalidTransactionId => "invalid_transaction_id",
            Self::DuplicateRegistration => "duplicate_registration",
            Self::DuplicateTransaction => "duplicate_transaction",
            Self::NotRegistered => "not_registered",
            Self::InsufficientBalance => "insufficient_balance",
            Self::AmountOverflow => "amount_overflow",
            Self::Integrity => "integrity",
            Self::Serialization => "serialization",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Registry(e) => match e {
                RegistryError::InvalidExternalRef { .. } => ErrorKind::InvalidExternalRef,
                RegistryError::InvalidAddress(_) => ErrorKind::InvalidAddress,
                RegistryError::DuplicateRegistration { .. } => ErrorKind::DuplicateRegistration,
                RegistryError::NotRegistered { .. } => ErrorKind::NotRegistered,
                RegistryError::LockPoisoned(_) => ErrorKind::Internal,
            },
            Self::Ledger(e) => match e {
                LedgerError::InvalidAmount => ErrorKind::InvalidAmount,
                LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
                LedgerError::DuplicateTransaction { .. } => ErrorKind::DuplicateTransaction,
                LedgerError::AmountOverflow { .. } => ErrorKind::AmountOverflow,
                LedgerError::IntegrityViolation { .. } => ErrorKind::Integrity,
                LedgerError::Serialization(_) => ErrorKind::Serialization,
                LedgerError::InvalidRange { .. } | LedgerError::LockPoisoned(_) => {
                    ErrorKind::Internal
                }
            },
            Self::Address(TypeError::EmptyId) | Self::TransactionId(_) => {
                ErrorKind::InvalidTransactionId
            }
            Self::Address(_) => ErrorKind::InvalidAddress,
            Self::Snapshot(_) => ErrorKind::Integrity,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use tipjar_types::{Address, Amount};

    use super::*;

    #[test]
    fn kinds_flatten_nested_errors() {
        let err = SdkError::from(RegistryError::NotRegistered {
            external_ref: "x".into(),
        });
        assert_eq!(err.kind(), ErrorKind::NotRegistered);

        let err = SdkError::from(LedgerError::InsufficientBalance {
            recipient: Address::parse("dj").unwrap(),
            requested: Amount::new(2),
            available: Amount::new(1),
        });
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);

        let err = SdkError::from(RegistryError::InvalidAddress(TypeError::EmptyAddress));
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);
        assert_eq!(SdkError::from(TypeError::EmptyAddress).kind(), ErrorKind::InvalidAddress);
        assert_eq!(
            SdkError::TransactionId(TypeError::EmptyId).kind(),
            ErrorKind::InvalidTransactionId
        );
        assert_eq!(SdkError::from(TypeError::EmptyId).kind(), ErrorKind::InvalidTransactionId);
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InsufficientBalance).unwrap();
        assert_eq!(json, "\"insufficient_balance\"");
        assert_eq!(ErrorKind::DuplicateTransaction.to_string(), "duplicate_transaction");
    }
}
