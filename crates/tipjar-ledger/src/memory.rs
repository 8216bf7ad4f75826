use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tipjar_types::{Address, Amount, TipId, WithdrawalId};

use crate::error::LedgerError;
use crate::records::{Digest, LedgerEntry, NewTip, Role, TipEvent, WithdrawalEvent};
use crate::traits::{LedgerReader, LedgerWriter};

/// In-memory ledger for embedding, local demos, and tests.
///
/// Entries live in one append-only `Vec` behind a `RwLock`, with secondary
/// indexes by id, recipient, and sender.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: Vec<LedgerEntry>,
    id_index: HashMap<String, usize>,
    by_recipient: HashMap<Address, Vec<usize>>,
    by_sender: HashMap<Address, Vec<usize>>,
}

impl LedgerState {
    fn next_seq(&self) -> u64 {
        self.entries.len() as u64 + 1
    }

    fn last_digest(&self) -> Option<Digest> {
        self.entries.last().map(LedgerEntry::digest)
    }

    /// Wall-clock time, clamped so the ledger never goes back in time.
    fn next_recorded_at(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.entries.last() {
            Some(last) if last.recorded_at() > now => last.recorded_at(),
            _ => now,
        }
    }

    fn ensure_unique(&self, id: &str) -> Result<(), LedgerError> {
        if self.id_index.contains_key(id) {
            return Err(LedgerError::DuplicateTransaction { id: id.to_string() });
        }
        Ok(())
    }

    fn push(&mut self, entry: LedgerEntry) {
        let index = self.entries.len();
        self.id_index.insert(entry.id().to_string(), index);
        self.by_recipient
            .entry(entry.recipient().clone())
            .or_default()
            .push(index);
        if let LedgerEntry::Tip(tip) = &entry {
            self.by_sender.entry(tip.sender.clone()).or_default().push(index);
        }
        self.entries.push(entry);
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerWriter for InMemoryLedger {
    fn append_tip(&self, id: TipId, tip: &NewTip) -> Result<TipEvent, LedgerError> {
        if tip.amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.inner.write()?;
        state.ensure_unique(id.as_str())?;

        let mut event = TipEvent {
            id,
            seq: state.next_seq(),
            recipient: tip.recipient.clone(),
            sender: tip.sender.clone(),
            amount: tip.amount,
            reference: tip.reference.clone(),
            recorded_at: state.next_recorded_at(),
            prev_digest: state.last_digest(),
            digest: Digest::ZERO,
        };
        event.digest = LedgerEntry::Tip(event.clone()).compute_digest()?;

        state.push(LedgerEntry::Tip(event.clone()));
        tracing::debug!(
            seq = event.seq,
            id = %event.id,
            recipient = %event.recipient,
            amount = %event.amount,
            "tip appended"
        );
        Ok(event)
    }

    fn append_withdrawal(
        &self,
        id: WithdrawalId,
        recipient: &Address,
        amount: Amount,
    ) -> Result<WithdrawalEvent, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.inner.write()?;
        state.ensure_unique(id.as_str())?;

        let mut event = WithdrawalEvent {
            id,
            seq: state.next_seq(),
            recipient: recipient.clone(),
            amount,
            recorded_at: state.next_recorded_at(),
            prev_digest: state.last_digest(),
            digest: Digest::ZERO,
        };
        event.digest = LedgerEntry::Withdrawal(event.clone()).compute_digest()?;

        state.push(LedgerEntry::Withdrawal(event.clone()));
        tracing::debug!(
            seq = event.seq,
            id = %event.id,
            recipient = %event.recipient,
            amount = %event.amount,
            "withdrawal appended"
        );
        Ok(event)
    }

    fn restore_entry(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let mut state = self.inner.write()?;

        let expected_seq = state.next_seq();
        if entry.seq() != expected_seq {
            return Err(LedgerError::IntegrityViolation {
                seq: entry.seq(),
                reason: format!("restore out of order; expected seq {expected_seq}"),
            });
        }

        if entry.prev_digest() != state.last_digest() {
            return Err(LedgerError::IntegrityViolation {
                seq: entry.seq(),
                reason: "previous digest link mismatch".into(),
            });
        }

        if entry.amount().is_zero() {
            return Err(LedgerError::IntegrityViolation {
                seq: entry.seq(),
                reason: "zero amount".into(),
            });
        }

        if entry.compute_digest()? != entry.digest() {
            return Err(LedgerError::IntegrityViolation {
                seq: entry.seq(),
                reason: "entry digest mismatch".into(),
            });
        }

        state.ensure_unique(entry.id())?;
        state.push(entry.clone());
        Ok(())
    }
}

impl LedgerReader for InMemoryLedger {
    fn head(&self) -> Result<Option<LedgerEntry>, LedgerError> {
        let state = self.inner.read()?;
        Ok(state.entries.last().cloned())
    }

    fn read_range(&self, from_seq: u64, to_seq: u64) -> Result<Vec<LedgerEntry>, LedgerError> {
        if from_seq == 0 || to_seq == 0 || from_seq > to_seq {
            return Err(LedgerError::InvalidRange {
                from: from_seq,
                to: to_seq,
            });
        }

        let state = self.inner.read()?;
        let start = (from_seq - 1) as usize;
        if start >= state.entries.len() {
            return Ok(vec![]);
        }

        let end_exclusive = to_seq.min(state.entries.len() as u64) as usize;
        Ok(state.entries[start..end_exclusive].to_vec())
    }

    fn read_all(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.inner.read()?;
        Ok(state.entries.clone())
    }

    fn get(&self, id: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        let state = self.inner.read()?;
        Ok(state
            .id_index
            .get(id)
            .and_then(|index| state.entries.get(*index))
            .cloned())
    }

    fn entry_count(&self) -> Result<u64, LedgerError> {
        let state = self.inner.read()?;
        Ok(state.entries.len() as u64)
    }

    fn transactions_for(
        &self,
        address: &Address,
        role: Role,
    ) -> Result<Vec<TipEvent>, LedgerError> {
        let state = self.inner.read()?;
        let index = match role {
            Role::Sender => &state.by_sender,
            Role::Recipient => &state.by_recipient,
        };

        let mut tips: Vec<TipEvent> = index
            .get(address)
            .into_iter()
            .flatten()
            .filter_map(|i| state.entries.get(*i))
            .filter_map(LedgerEntry::as_tip)
            .cloned()
            .collect();
        // Stable: equal timestamps keep insertion order.
        tips.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(tips)
    }

    fn withdrawals_for(&self, recipient: &Address) -> Result<Vec<WithdrawalEvent>, LedgerError> {
        let state = self.inner.read()?;
        let mut withdrawals: Vec<WithdrawalEvent> = state
            .by_recipient
            .get(recipient)
            .into_iter()
            .flatten()
            .filter_map(|i| state.entries.get(*i))
            .filter_map(LedgerEntry::as_withdrawal)
            .cloned()
            .collect();
        withdrawals.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(withdrawals)
    }
}
