use std::collections::BTreeMap;

use tipjar_types::{Address, Amount};

use crate::aggregate::Aggregator;
use crate::error::LedgerError;
use crate::records::LedgerEntry;
use crate::traits::LedgerReader;

/// Aggregates rebuilt by replaying a ledger from its first entry.
#[derive(Debug)]
pub struct ReplayResult {
    pub entries_evaluated: u64,
    pub tips_applied: u64,
    pub withdrawals_applied: u64,
    pub aggregates: Aggregator,
}

/// Deterministic replay of ledger entries into aggregates.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Rebuild every aggregate from genesis.
    ///
    /// Fails on the first entry that could not have been accepted live,
    /// such as a withdrawal exceeding the balance at that point.
    pub fn rebuild<R: LedgerReader>(reader: &R) -> Result<ReplayResult, LedgerError> {
        let entries = reader.read_all()?;
        Self::rebuild_entries(&entries)
    }

    pub fn rebuild_entries(entries: &[LedgerEntry]) -> Result<ReplayResult, LedgerError> {
        let aggregates = Aggregator::new();
        let mut tips_applied = 0u64;
        let mut withdrawals_applied = 0u64;

        for entry in entries {
            aggregates
                .apply_entry(entry)
                .map_err(|e| LedgerError::IntegrityViolation {
                    seq: entry.seq(),
                    reason: e.to_string(),
                })?;
            match entry {
                LedgerEntry::Tip(_) => tips_applied += 1,
                LedgerEntry::Withdrawal(_) => withdrawals_applied += 1,
            }
        }

        Ok(ReplayResult {
            entries_evaluated: entries.len() as u64,
            tips_applied,
            withdrawals_applied,
            aggregates,
        })
    }

    /// Balances computed as a plain fold over the ledger:
    /// sum of tips minus sum of withdrawals, per recipient.
    pub fn balances<R: LedgerReader>(reader: &R) -> Result<BTreeMap<Address, Amount>, LedgerError> {
        let mut balances: BTreeMap<Address, Amount> = BTreeMap::new();
        for entry in reader.read_all()? {
            let balance = balances.entry(entry.recipient().clone()).or_default();
            let next = match &entry {
                LedgerEntry::Tip(t) => balance.checked_add(t.amount),
                LedgerEntry::Withdrawal(w) => balance.checked_sub(w.amount),
            };
            *balance = next.ok_or_else(|| LedgerError::IntegrityViolation {
                seq: entry.seq(),
                reason: format!("balance of {} leaves the u64 range", entry.recipient()),
            })?;
        }
        Ok(balances)
    }
}

#[cfg(test)]
mod tests {
    use tipjar_types::{IdGenerator, TipId};

    use super::*;
    use crate::memory::tests::{addr, new_tip};
    use crate::memory::InMemoryLedger;
    use crate::traits::LedgerWriter;

    #[test]
    fn rebuild_matches_fold() {
        let ledger = InMemoryLedger::new();
        let ids = IdGenerator::new();
        ledger.append_tip(ids.next_tip_id(), &new_tip("dj-a", "fan-1", 500)).unwrap();
        ledger.append_tip(ids.next_tip_id(), &new_tip("dj-a", "fan-2", 1500)).unwrap();
        ledger.append_tip(ids.next_tip_id(), &new_tip("dj-b", "fan-1", 70)).unwrap();
        ledger
            .append_withdrawal(ids.next_withdrawal_id(), &addr("dj-a"), Amount::new(400))
            .unwrap();

        let result = ReplayEngine::rebuild(&ledger).unwrap();
        assert_eq!(result.entries_evaluated, 4);
        assert_eq!(result.tips_applied, 3);
        assert_eq!(result.withdrawals_applied, 1);

        let folded = ReplayEngine::balances(&ledger).unwrap();
        for (recipient, balance) in &folded {
            assert_eq!(result.aggregates.balance_of(recipient).unwrap(), *balance);
        }
        assert_eq!(folded[&addr("dj-a")], Amount::new(1600));
        assert_eq!(folded[&addr("dj-b")], Amount::new(70));
    }

    #[test]
    fn rebuild_rejects_overdrawn_history() {
        // The ledger itself does not enforce balances; the pool does.
        let ledger = InMemoryLedger::new();
        let ids = IdGenerator::new();
        ledger
            .append_tip(TipId::external("tx-1").unwrap(), &new_tip("dj", "fan", 10))
            .unwrap();
        ledger
            .append_withdrawal(ids.next_withdrawal_id(), &addr("dj"), Amount::new(11))
            .unwrap();

        assert!(matches!(
            ReplayEngine::rebuild(&ledger),
            Err(LedgerError::IntegrityViolation { seq: 2, .. })
        ));
        assert!(matches!(
            ReplayEngine::balances(&ledger),
            Err(LedgerError::IntegrityViolation { seq: 2, .. })
        ));
    }

    #[test]
    fn rebuild_empty_ledger() {
        let ledger = InMemoryLedger::new();
        let result = ReplayEngine::rebuild(&ledger).unwrap();
        assert_eq!(result.entries_evaluated, 0);
        assert_eq!(result.aggregates.global_stats().unwrap().transaction_count, 0);
        assert!(ReplayEngine::balances(&ledger).unwrap().is_empty());
    }
}
