use tipjar_types::{Address, Amount, TipId, WithdrawalId};

use crate::error::LedgerError;
use crate::records::{LedgerEntry, NewTip, Role, TipEvent, WithdrawalEvent};

/// Write boundary for ledger append operations.
///
/// Appends are all-or-nothing: on error the ledger is unchanged.
pub trait LedgerWriter: Send + Sync {
    fn append_tip(&self, id: TipId, tip: &NewTip) -> Result<TipEvent, LedgerError>;

    fn append_withdrawal(
        &self,
        id: WithdrawalId,
        recipient: &Address,
        amount: Amount,
    ) -> Result<WithdrawalEvent, LedgerError>;

    /// Append a previously exported entry verbatim, verifying that it
    /// continues the sequence and hash chain.
    fn restore_entry(&self, entry: &LedgerEntry) -> Result<(), LedgerError>;
}

/// Read boundary for ledger queries and replay.
pub trait LedgerReader: Send + Sync {
    fn head(&self) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Inclusive, 1-based sequence range.
    fn read_range(&self, from_seq: u64, to_seq: u64) -> Result<Vec<LedgerEntry>, LedgerError>;

    fn read_all(&self) -> Result<Vec<LedgerEntry>, LedgerError>;

    fn get(&self, id: &str) -> Result<Option<LedgerEntry>, LedgerError>;

    fn entry_count(&self) -> Result<u64, LedgerError>;

    /// Tips where `address` plays `role`, most recent first.
    ///
    /// Ordered by `recorded_at` descending; entries with equal timestamps
    /// keep their insertion order.
    fn transactions_for(&self, address: &Address, role: Role)
        -> Result<Vec<TipEvent>, LedgerError>;

    /// Withdrawals for `recipient`, in the same order as
    /// [`transactions_for`](Self::transactions_for).
    fn withdrawals_for(&self, recipient: &Address) -> Result<Vec<WithdrawalEvent>, LedgerError>;
}
