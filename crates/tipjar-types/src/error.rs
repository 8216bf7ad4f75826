use thiserror::Error;

/// Errors produced by type construction and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("address must not be empty")]
    EmptyAddress,

    #[error("address contains whitespace: {0:?}")]
    WhitespaceInAddress(String),

    #[error("invalid {asset} address {address:?}: {reason}")]
    InvalidAddress {
        asset: String,
        address: String,
        reason: String,
    },

    #[error("unknown asset kind: {0}")]
    UnknownAsset(String),

    #[error("identifier must not be empty")]
    EmptyId,
}
