use tipjar_types::{Address, Amount, IdGenerator};

use crate::aggregate::{Aggregator, GlobalStats, RecipientStats, TopRecipient};
use crate::error::LedgerError;
use crate::memory::InMemoryLedger;
use crate::records::{LedgerEntry, NewTip, Role, TipEvent, WithdrawalEvent, WithdrawalReceipt};
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::{ConsistencyReport, ConsistencyValidator};

/// The tip pool: an append-only ledger plus the aggregates derived from it.
///
/// Each mutation holds the affected recipient's lock across the ledger append
/// and the aggregate update, so readers never observe a recorded tip without
/// its balance change. Different recipients proceed in parallel.
#[derive(Debug, Default)]
pub struct TipPool<L = InMemoryLedger> {
    ledger: L,
    aggregator: Aggregator,
    ids: IdGenerator,
}

impl TipPool<InMemoryLedger> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L> TipPool<L>
where
    L: LedgerWriter + LedgerReader,
{
    /// Wrap an empty ledger. Use [`restore`](Self::restore) to load history.
    pub fn with_ledger(ledger: L) -> Self {
        Self {
            ledger,
            aggregator: Aggregator::new(),
            ids: IdGenerator::new(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Record a tip and credit the recipient.
    ///
    /// Uses the wallet's transaction id when one is supplied, otherwise
    /// generates one. A rejected tip leaves no trace.
    pub fn record(&self, tip: NewTip) -> Result<TipEvent, LedgerError> {
        if tip.amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let event = self.aggregator.credit(&tip.recipient, tip.amount, || {
            let id = match &tip.external_tx_id {
                Some(id) => id.clone(),
                None => self.ids.next_tip_id(),
            };
            self.ledger.append_tip(id, &tip)
        })?;

        tracing::debug!(
            id = %event.id,
            recipient = %event.recipient,
            sender = %event.sender,
            amount = %event.amount,
            "tip recorded"
        );
        Ok(event)
    }

    /// Move `amount` out of the recipient's balance.
    pub fn withdraw(
        &self,
        recipient: &Address,
        amount: Amount,
    ) -> Result<WithdrawalReceipt, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let result = self.aggregator.debit(recipient, amount, || {
            self.ledger
                .append_withdrawal(self.ids.next_withdrawal_id(), recipient, amount)
        });

        match &result {
            Ok(receipt) => tracing::debug!(
                id = %receipt.withdrawal.id,
                recipient = %recipient,
                amount = %amount,
                remaining = %receipt.remaining_balance,
                "withdrawal recorded"
            ),
            Err(LedgerError::InsufficientBalance { available, .. }) => tracing::warn!(
                recipient = %recipient,
                requested = %amount,
                available = %available,
                "withdrawal rejected"
            ),
            Err(_) => {}
        }
        result
    }

    /// Load exported entries into an empty pool, in sequence order.
    ///
    /// Every entry is re-verified against the hash chain and replayed through
    /// the same balance rules as live operations. On error the pool holds a
    /// prefix of the history and should be discarded.
    pub fn restore<'a, I>(&self, entries: I) -> Result<u64, LedgerError>
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        let mut restored = 0u64;
        for entry in entries {
            match entry {
                LedgerEntry::Tip(tip) => {
                    self.aggregator.credit(&tip.recipient, tip.amount, || {
                        self.ledger.restore_entry(entry)?;
                        Ok(tip.clone())
                    })?;
                }
                LedgerEntry::Withdrawal(w) => {
                    self.aggregator.debit(&w.recipient, w.amount, || {
                        self.ledger.restore_entry(entry)?;
                        Ok(w.clone())
                    })?;
                }
            }
            restored += 1;
        }
        Ok(restored)
    }

    pub fn balance_of(&self, recipient: &Address) -> Result<Amount, LedgerError> {
        self.aggregator.balance_of(recipient)
    }

    pub fn stats_of(&self, recipient: &Address) -> Result<RecipientStats, LedgerError> {
        self.aggregator.stats_of(recipient)
    }

    pub fn global_stats(&self) -> Result<GlobalStats, LedgerError> {
        self.aggregator.global_stats()
    }

    pub fn top_recipients(&self, limit: usize) -> Result<Vec<TopRecipient>, LedgerError> {
        self.aggregator.top_recipients(limit)
    }

    pub fn transactions_for(
        &self,
        address: &Address,
        role: Role,
    ) -> Result<Vec<TipEvent>, LedgerError> {
        self.ledger.transactions_for(address, role)
    }

    pub fn withdrawals_for(&self, recipient: &Address) -> Result<Vec<WithdrawalEvent>, LedgerError> {
        self.ledger.withdrawals_for(recipient)
    }

    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.ledger.read_all()
    }

    pub fn len(&self) -> Result<u64, LedgerError> {
        self.ledger.entry_count()
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Re-derive every aggregate from the ledger and compare.
    pub fn verify(&self) -> Result<ConsistencyReport, LedgerError> {
        ConsistencyValidator::validate(&self.ledger, &self.aggregator)
    }
}
