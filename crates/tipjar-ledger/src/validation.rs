use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregator;
use crate::error::LedgerError;
use crate::records::LedgerEntry;
use crate::replay::ReplayEngine;
use crate::traits::LedgerReader;

/// Result of checking a ledger and its live aggregates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub entry_count: u64,
    pub chain_valid: bool,
    pub aggregates_consistent: bool,
    pub violations: Vec<Violation>,
}

impl ConsistencyReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific problem found during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Offending entry, if the problem is tied to one.
    pub seq: Option<u64>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    SequenceGap,
    ChainBreak,
    DigestMismatch,
    DuplicateId,
    ZeroAmount,
    Overdraft,
    BalanceMismatch,
    StatsMismatch,
    GlobalMismatch,
}

/// Ledger and aggregate consistency checks.
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    /// Check the hash chain, then compare `live` against a fresh replay.
    pub fn validate<R: LedgerReader>(
        reader: &R,
        live: &Aggregator,
    ) -> Result<ConsistencyReport, LedgerError> {
        let entries = reader.read_all()?;
        let mut violations = Self::check_chain(&entries);
        let chain_valid = violations.is_empty();

        let before = violations.len();
        match ReplayEngine::rebuild_entries(&entries) {
            Ok(replayed) => {
                violations.extend(Self::compare(live, &replayed.aggregates)?);
            }
            Err(LedgerError::IntegrityViolation { seq, reason }) => violations.push(Violation {
                seq: Some(seq),
                kind: ViolationKind::Overdraft,
                description: reason,
            }),
            Err(other) => return Err(other),
        }
        let aggregates_consistent = violations.len() == before;

        Ok(ConsistencyReport {
            entry_count: entries.len() as u64,
            chain_valid,
            aggregates_consistent,
            violations,
        })
    }

    /// Structural checks on an entry stream. Does not look at balances.
    pub fn check_chain(entries: &[LedgerEntry]) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut seen_ids = HashSet::new();

        for (index, entry) in entries.iter().enumerate() {
            let seq = Some(entry.seq());

            let expected_seq = (index + 1) as u64;
            if entry.seq() != expected_seq {
                violations.push(Violation {
                    seq,
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected seq {expected_seq}, got {}", entry.seq()),
                });
            }

            let expected_prev = index.checked_sub(1).map(|i| entries[i].digest());
            if entry.prev_digest() != expected_prev {
                violations.push(Violation {
                    seq,
                    kind: ViolationKind::ChainBreak,
                    description: "previous digest link mismatch".into(),
                });
            }

            match entry.compute_digest() {
                Ok(digest) if digest == entry.digest() => {}
                Ok(_) => violations.push(Violation {
                    seq,
                    kind: ViolationKind::DigestMismatch,
                    description: "entry digest does not match computed".into(),
                }),
                Err(e) => violations.push(Violation {
                    seq,
                    kind: ViolationKind::DigestMismatch,
                    description: e.to_string(),
                }),
            }

            if !seen_ids.insert(entry.id()) {
                violations.push(Violation {
                    seq,
                    kind: ViolationKind::DuplicateId,
                    description: format!("id {} appears more than once", entry.id()),
                });
            }

            if entry.amount().is_zero() {
                violations.push(Violation {
                    seq,
                    kind: ViolationKind::ZeroAmount,
                    description: "entry has zero amount".into(),
                });
            }
        }

        violations
    }

    fn compare(live: &Aggregator, replayed: &Aggregator) -> Result<Vec<Violation>, LedgerError> {
        let mut violations = Vec::new();

        let recipients: BTreeSet<_> = live
            .recipients()?
            .into_iter()
            .chain(replayed.recipients()?)
            .collect();

        for recipient in recipients {
            let cached = live.stats_of(&recipient)?;
            let derived = replayed.stats_of(&recipient)?;
            if cached.balance != derived.balance {
                violations.push(Violation {
                    seq: None,
                    kind: ViolationKind::BalanceMismatch,
                    description: format!(
                        "{recipient}: cached balance {} but ledger gives {}",
                        cached.balance, derived.balance
                    ),
                });
            } else if cached != derived {
                violations.push(Violation {
                    seq: None,
                    kind: ViolationKind::StatsMismatch,
                    description: format!("{recipient}: cached stats differ from ledger"),
                });
            }
        }

        if live.global_stats()? != replayed.global_stats()? {
            violations.push(Violation {
                seq: None,
                kind: ViolationKind::GlobalMismatch,
                description: "cached global totals differ from ledger".into(),
            });
        }

        Ok(violations)
    }
}
