//! Running per-recipient and pool-wide aggregates.
//!
//! Every recipient has its own [`RecipientAccount`] behind a `Mutex`, so
//! operations on different recipients never contend. Pool-wide counters live
//! in a separate `Mutex`. Locks are always taken in the order
//! account -> ledger -> global totals.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tipjar_types::{Address, Amount};

use crate::error::LedgerError;
use crate::records::{LedgerEntry, TipEvent, WithdrawalEvent, WithdrawalReceipt};

/// Totals for one reference (e.g. one track) under a recipient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceStats {
    pub total_received: Amount,
    pub tip_count: u64,
}

/// Mutable running state for one recipient.
#[derive(Clone, Debug)]
pub struct RecipientAccount {
    recipient: Address,
    balance: Amount,
    total_received: Amount,
    total_withdrawn: Amount,
    tip_count: u64,
    senders: HashSet<Address>,
    per_reference: BTreeMap<String, ReferenceStats>,
    first_tip_seq: Option<u64>,
}

impl RecipientAccount {
    fn new(recipient: Address) -> Self {
        Self {
            recipient,
            balance: Amount::ZERO,
            total_received: Amount::ZERO,
            total_withdrawn: Amount::ZERO,
            tip_count: 0,
            senders: HashSet::new(),
            per_reference: BTreeMap::new(),
            first_tip_seq: None,
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Verify that crediting `amount` cannot overflow any counter.
    fn check_tip(&self, amount: Amount) -> Result<(), LedgerError> {
        let overflow = || LedgerError::AmountOverflow {
            recipient: self.recipient.clone(),
        };
        self.balance.checked_add(amount).ok_or_else(overflow)?;
        self.total_received.checked_add(amount).ok_or_else(overflow)?;
        Ok(())
    }

    /// Returns true if this was the recipient's first tip.
    fn apply_tip(&mut self, tip: &TipEvent) -> bool {
        self.balance = self.balance.saturating_add(tip.amount);
        self.total_received = self.total_received.saturating_add(tip.amount);
        self.tip_count += 1;
        self.senders.insert(tip.sender.clone());

        let per_ref = self.per_reference.entry(tip.reference.clone()).or_default();
        per_ref.total_received = per_ref.total_received.saturating_add(tip.amount);
        per_ref.tip_count += 1;

        let first = self.first_tip_seq.is_none();
        if first {
            self.first_tip_seq = Some(tip.seq);
        }
        first
    }

    fn check_withdrawal(&self, amount: Amount) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientBalance {
                recipient: self.recipient.clone(),
                requested: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    fn apply_withdrawal(&mut self, withdrawal: &WithdrawalEvent) -> Amount {
        self.balance = self
            .balance
            .checked_sub(withdrawal.amount)
            .unwrap_or(Amount::ZERO);
        self.total_withdrawn = self.total_withdrawn.saturating_add(withdrawal.amount);
        self.balance
    }

    pub fn stats(&self) -> RecipientStats {
        RecipientStats {
            recipient: self.recipient.clone(),
            total_received: self.total_received,
            total_withdrawn: self.total_withdrawn,
            balance: self.balance,
            tip_count: self.tip_count,
            unique_senders: self.senders.len(),
            per_reference: self.per_reference.clone(),
        }
    }
}

/// Point-in-time summary of one recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientStats {
    pub recipient: Address,
    pub total_received: Amount,
    pub total_withdrawn: Amount,
    pub balance: Amount,
    pub tip_count: u64,
    pub unique_senders: usize,
    pub per_reference: BTreeMap<String, ReferenceStats>,
}

impl RecipientStats {
    /// Stats for a recipient with no activity.
    pub fn empty(recipient: Address) -> Self {
        RecipientAccount::new(recipient).stats()
    }
}

/// Pool-wide totals. Sums are `u128` so they cannot overflow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_tipped: u128,
    pub total_withdrawn: u128,
    pub pool_balance: u128,
    /// Number of recorded tips. Withdrawals are counted separately.
    pub transaction_count: u64,
    pub withdrawal_count: u64,
    pub unique_recipients: u64,
    pub unique_senders: u64,
}

/// One row of the top-recipients ranking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopRecipient {
    pub recipient: Address,
    pub total_received: Amount,
    pub unique_senders: usize,
    pub tip_count: u64,
}

#[derive(Debug, Default)]
struct GlobalTotals {
    total_tipped: u128,
    total_withdrawn: u128,
    tip_count: u64,
    withdrawal_count: u64,
    recipients_with_tips: u64,
    senders: HashSet<Address>,
}

type SharedAccount = Arc<Mutex<RecipientAccount>>;

/// Concurrent aggregate state derived from the ledger.
#[derive(Debug, Default)]
pub struct Aggregator {
    accounts: RwLock<HashMap<Address, SharedAccount>>,
    global: Mutex<GlobalTotals>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn account(&self, recipient: &Address) -> Result<Option<SharedAccount>, LedgerError> {
        let accounts = self.accounts.read()?;
        Ok(accounts.get(recipient).cloned())
    }

    fn account_or_insert(&self, recipient: &Address) -> Result<SharedAccount, LedgerError> {
        if let Some(account) = self.account(recipient)? {
            return Ok(account);
        }
        let mut accounts = self.accounts.write()?;
        Ok(accounts
            .entry(recipient.clone())
            .or_insert_with(|| Arc::new(Mutex::new(RecipientAccount::new(recipient.clone()))))
            .clone())
    }

    /// Drop an account a failed credit created, unless it was tipped or
    /// someone else holds it.
    fn discard_if_unused(
        &self,
        recipient: &Address,
        shared: SharedAccount,
    ) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write()?;
        // One handle in the map plus ours.
        if Arc::strong_count(&shared) > 2 || shared.lock()?.tip_count > 0 {
            return Ok(());
        }
        accounts.remove(recipient);
        Ok(())
    }

    /// Credit a tip while holding the recipient's lock.
    ///
    /// `append` runs after the overflow check and before any aggregate is
    /// touched; if it fails nothing changes, and an account created for this
    /// call is removed again.
    pub(crate) fn credit<F>(
        &self,
        recipient: &Address,
        amount: Amount,
        append: F,
    ) -> Result<TipEvent, LedgerError>
    where
        F: FnOnce() -> Result<TipEvent, LedgerError>,
    {
        let shared = self.account_or_insert(recipient)?;
        let mut account = shared.lock()?;
        let checked = account.check_tip(amount).and_then(|()| append());
        let event = match checked {
            Ok(event) => event,
            Err(err) => {
                drop(account);
                self.discard_if_unused(recipient, shared)?;
                return Err(err);
            }
        };
        let first_tip = account.apply_tip(&event);

        let mut global = self.global.lock()?;
        global.total_tipped = global.total_tipped.saturating_add(u128::from(event.amount.units()));
        global.tip_count += 1;
        if first_tip {
            global.recipients_with_tips += 1;
        }
        global.senders.insert(event.sender.clone());
        Ok(event)
    }

    /// Debit a withdrawal while holding the recipient's lock.
    ///
    /// A recipient with no account has a zero balance.
    pub(crate) fn debit<F>(
        &self,
        recipient: &Address,
        amount: Amount,
        append: F,
    ) -> Result<WithdrawalReceipt, LedgerError>
    where
        F: FnOnce() -> Result<WithdrawalEvent, LedgerError>,
    {
        let Some(account) = self.account(recipient)? else {
            return Err(LedgerError::InsufficientBalance {
                recipient: recipient.clone(),
                requested: amount,
                available: Amount::ZERO,
            });
        };
        let mut account = account.lock()?;
        account.check_withdrawal(amount)?;

        let withdrawal = append()?;
        let remaining_balance = account.apply_withdrawal(&withdrawal);

        let mut global = self.global.lock()?;
        global.total_withdrawn = global
            .total_withdrawn
            .saturating_add(u128::from(withdrawal.amount.units()));
        global.withdrawal_count += 1;
        Ok(WithdrawalReceipt {
            withdrawal,
            remaining_balance,
        })
    }

    /// Fold an already-recorded entry into the aggregates.
    pub fn apply_entry(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        match entry {
            LedgerEntry::Tip(tip) => self
                .credit(&tip.recipient, tip.amount, || Ok(tip.clone()))
                .map(|_| ()),
            LedgerEntry::Withdrawal(w) => self
                .debit(&w.recipient, w.amount, || Ok(w.clone()))
                .map(|_| ()),
        }
    }

    /// Current balance; zero for unknown recipients.
    pub fn balance_of(&self, recipient: &Address) -> Result<Amount, LedgerError> {
        let Some(account) = self.account(recipient)? else {
            return Ok(Amount::ZERO);
        };
        let balance = account.lock()?.balance();
        Ok(balance)
    }

    pub fn stats_of(&self, recipient: &Address) -> Result<RecipientStats, LedgerError> {
        let Some(account) = self.account(recipient)? else {
            return Ok(RecipientStats::empty(recipient.clone()));
        };
        let stats = account.lock()?.stats();
        Ok(stats)
    }

    pub fn global_stats(&self) -> Result<GlobalStats, LedgerError> {
        let global = self.global.lock()?;
        Ok(GlobalStats {
            total_tipped: global.total_tipped,
            total_withdrawn: global.total_withdrawn,
            pool_balance: global.total_tipped.saturating_sub(global.total_withdrawn),
            transaction_count: global.tip_count,
            withdrawal_count: global.withdrawal_count,
            unique_recipients: global.recipients_with_tips,
            unique_senders: global.senders.len() as u64,
        })
    }

    /// Recipients ranked by total received, highest first.
    ///
    /// Ties go to the recipient whose first tip was recorded earlier.
    /// Recipients that never received a tip are excluded.
    pub fn top_recipients(&self, limit: usize) -> Result<Vec<TopRecipient>, LedgerError> {
        let mut ranked = Vec::new();
        for account in self.snapshot_accounts()? {
            let account = account.lock()?;
            let Some(first_seq) = account.first_tip_seq else {
                continue;
            };
            ranked.push((
                first_seq,
                TopRecipient {
                    recipient: account.recipient.clone(),
                    total_received: account.total_received,
                    unique_senders: account.senders.len(),
                    tip_count: account.tip_count,
                },
            ));
        }

        ranked.sort_by(|(seq_a, a), (seq_b, b)| {
            b.total_received
                .cmp(&a.total_received)
                .then(seq_a.cmp(seq_b))
        });
        ranked.truncate(limit);
        Ok(ranked.into_iter().map(|(_, top)| top).collect())
    }

    /// Every recipient with an account, sorted by address.
    pub fn recipients(&self) -> Result<Vec<Address>, LedgerError> {
        let accounts = self.accounts.read()?;
        let mut recipients: Vec<Address> = accounts.keys().cloned().collect();
        recipients.sort();
        Ok(recipients)
    }

    fn snapshot_accounts(&self) -> Result<Vec<SharedAccount>, LedgerError> {
        let accounts = self.accounts.read()?;
        Ok(accounts.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tipjar_types::{IdGenerator, TipId};

    use super::*;
    use crate::records::Digest;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn tip(seq: u64, recipient: &str, sender: &str, amount: u64, reference: &str) -> TipEvent {
        TipEvent {
            id: TipId::external(format!("tx-{seq}")).unwrap(),
            seq,
            recipient: addr(recipient),
            sender: addr(sender),
            amount: Amount::new(amount),
            reference: reference.into(),
            recorded_at: Utc::now(),
            prev_digest: None,
            digest: Digest::ZERO,
        }
    }

    fn withdrawal(seq: u64, recipient: &str, amount: u64) -> WithdrawalEvent {
        WithdrawalEvent {
            id: IdGenerator::new().next_withdrawal_id(),
            seq,
            recipient: addr(recipient),
            amount: Amount::new(amount),
            recorded_at: Utc::now(),
            prev_digest: None,
            digest: Digest::ZERO,
        }
    }

    #[test]
    fn stats_track_senders_and_references() {
        let agg = Aggregator::new();
        agg.apply_entry(&LedgerEntry::Tip(tip(1, "dj", "fan-1", 500, "track-a")))
            .unwrap();
        agg.apply_entry(&LedgerEntry::Tip(tip(2, "dj", "fan-2", 1500, "track-a")))
            .unwrap();
        agg.apply_entry(&LedgerEntry::Tip(tip(3, "dj", "fan-1", 100, "track-b")))
            .unwrap();

        let stats = agg.stats_of(&addr("dj")).unwrap();
        assert_eq!(stats.total_received, Amount::new(2100));
        assert_eq!(stats.balance, Amount::new(2100));
        assert_eq!(stats.tip_count, 3);
        assert_eq!(stats.unique_senders, 2);
        assert_eq!(
            stats.per_reference["track-a"],
            ReferenceStats {
                total_received: Amount::new(2000),
                tip_count: 2
            }
        );
    }

    #[test]
    fn unknown_recipient_reads_as_zero() {
        let agg = Aggregator::new();
        assert_eq!(agg.balance_of(&addr("nobody")).unwrap(), Amount::ZERO);
        let stats = agg.stats_of(&addr("nobody")).unwrap();
        assert_eq!(stats, RecipientStats::empty(addr("nobody")));
        assert!(agg.recipients().unwrap().is_empty());
    }

    #[test]
    fn overdraft_is_rejected_without_change() {
        let agg = Aggregator::new();
        agg.apply_entry(&LedgerEntry::Tip(tip(1, "dj", "fan", 100, "r")))
            .unwrap();

        let err = agg
            .apply_entry(&LedgerEntry::Withdrawal(withdrawal(2, "dj", 101)))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                recipient: addr("dj"),
                requested: Amount::new(101),
                available: Amount::new(100),
            }
        );
        assert_eq!(agg.balance_of(&addr("dj")).unwrap(), Amount::new(100));
        assert_eq!(agg.global_stats().unwrap().withdrawal_count, 0);
    }

    #[test]
    fn withdrawal_from_unknown_recipient_has_zero_available() {
        let agg = Aggregator::new();
        let err = agg
            .apply_entry(&LedgerEntry::Withdrawal(withdrawal(1, "ghost", 1)))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { available, .. } if available == Amount::ZERO
        ));
        assert!(agg.recipients().unwrap().is_empty());
    }

    #[test]
    fn failed_credit_leaves_no_account_behind() {
        let agg = Aggregator::new();
        let err = agg
            .credit(&addr("dj"), Amount::new(5), || {
                Err(LedgerError::DuplicateTransaction {
                    id: "tx-1".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateTransaction { .. }));
        assert!(agg.recipients().unwrap().is_empty());
        assert_eq!(agg.global_stats().unwrap().unique_recipients, 0);

        // A tipped account survives a later failure.
        agg.apply_entry(&LedgerEntry::Tip(tip(1, "dj", "fan", 5, "r")))
            .unwrap();
        agg.credit(&addr("dj"), Amount::new(1), || Err(LedgerError::InvalidAmount))
            .unwrap_err();
        assert_eq!(agg.recipients().unwrap(), vec![addr("dj")]);
        assert_eq!(agg.balance_of(&addr("dj")).unwrap(), Amount::new(5));
    }

    #[test]
    fn overflow_is_rejected() {
        let agg = Aggregator::new();
        agg.apply_entry(&LedgerEntry::Tip(tip(1, "dj", "fan", u64::MAX, "r")))
            .unwrap();
        let err = agg
            .apply_entry(&LedgerEntry::Tip(tip(2, "dj", "fan", 1, "r")))
            .unwrap_err();
        assert_eq!(err, LedgerError::AmountOverflow { recipient: addr("dj") });
        assert_eq!(agg.stats_of(&addr("dj")).unwrap().tip_count, 1);
    }

    #[test]
    fn global_stats_count_tips_and_withdrawals_separately() {
        let agg = Aggregator::new();
        agg.apply_entry(&LedgerEntry::Tip(tip(1, "dj-a", "fan-1", u64::MAX, "r")))
            .unwrap();
        agg.apply_entry(&LedgerEntry::Tip(tip(2, "dj-b", "fan-1", u64::MAX, "r")))
            .unwrap();
        agg.apply_entry(&LedgerEntry::Withdrawal(withdrawal(3, "dj-a", 10)))
            .unwrap();

        let global = agg.global_stats().unwrap();
        assert_eq!(global.total_tipped, 2 * u128::from(u64::MAX));
        assert_eq!(global.total_withdrawn, 10);
        assert_eq!(global.pool_balance, 2 * u128::from(u64::MAX) - 10);
        assert_eq!(global.transaction_count, 2);
        assert_eq!(global.withdrawal_count, 1);
        assert_eq!(global.unique_recipients, 2);
        assert_eq!(global.unique_senders, 1);
    }

    #[test]
    fn top_recipients_break_ties_by_first_tip() {
        let agg = Aggregator::new();
        agg.apply_entry(&LedgerEntry::Tip(tip(1, "dj-b", "fan", 300, "r")))
            .unwrap();
        agg.apply_entry(&LedgerEntry::Tip(tip(2, "dj-a", "fan", 300, "r")))
            .unwrap();
        agg.apply_entry(&LedgerEntry::Tip(tip(3, "dj-c", "fan", 500, "r")))
            .unwrap();

        let top: Vec<String> = agg
            .top_recipients(10)
            .unwrap()
            .into_iter()
            .map(|t| t.recipient.to_string())
            .collect();
        assert_eq!(top, vec!["dj-c", "dj-b", "dj-a"]);

        assert_eq!(agg.top_recipients(1).unwrap().len(), 1);
        assert!(agg.top_recipients(0).unwrap().is_empty());
    }

    #[test]
    fn ranking_uses_lifetime_total_not_balance() {
        let agg = Aggregator::new();
        agg.apply_entry(&LedgerEntry::Tip(tip(1, "dj-a", "fan", 1000, "r")))
            .unwrap();
        agg.apply_entry(&LedgerEntry::Tip(tip(2, "dj-b", "fan", 600, "r")))
            .unwrap();
        agg.apply_entry(&LedgerEntry::Withdrawal(withdrawal(3, "dj-a", 1000)))
            .unwrap();

        let top = agg.top_recipients(10).unwrap();
        assert_eq!(top[0].recipient, addr("dj-a"));
        assert_eq!(top[0].total_received, Amount::new(1000));
    }
}
