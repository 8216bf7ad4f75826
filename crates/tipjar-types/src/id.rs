use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a tip in the ledger.
///
/// Either the external transaction id handed back by the wallet/chain
/// collaborator, or a locally generated `tip-...` id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TipId(String);

impl TipId {
    /// Wrap an externally supplied transaction id.
    pub fn external(tx_id: impl Into<String>) -> Result<Self, TypeError> {
        let tx_id = tx_id.into();
        if tx_id.trim().is_empty() {
            return Err(TypeError::EmptyId);
        }
        Ok(Self(tx_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TipId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::external(value)
    }
}

impl From<TipId> for String {
    fn from(id: TipId) -> Self {
        id.0
    }
}

impl fmt::Debug for TipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TipId({})", self.0)
    }
}

impl fmt::Display for TipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a withdrawal in the ledger. Always locally generated.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WithdrawalId(String);

impl WithdrawalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WithdrawalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WithdrawalId({})", self.0)
    }
}

impl fmt::Display for WithdrawalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const SUFFIX_LEN: usize = 7;

/// Source of process-unique ledger identifiers.
///
/// Ids have the form `{prefix}-{counter}-{micros}-{suffix}`: a monotonic
/// counter, the wall-clock time in microseconds, and a random alphanumeric
/// suffix. The counter alone makes ids unique within one generator; the
/// timestamp and suffix keep ids from separate processes apart. Ids are not
/// security tokens.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_tip_id(&self) -> TipId {
        TipId(self.next_raw("tip"))
    }

    pub fn next_withdrawal_id(&self) -> WithdrawalId {
        WithdrawalId(self.next_raw("wd"))
    }

    fn next_raw(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let micros = chrono::Utc::now().timestamp_micros();
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        format!("{prefix}-{n}-{micros}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn external_ids_must_be_non_blank() {
        assert_eq!(TipId::external("  "), Err(TypeError::EmptyId));
        assert_eq!(TipId::external("0xdeadbeef").unwrap().as_str(), "0xdeadbeef");
    }

    #[test]
    fn generated_ids_have_expected_shape() {
        let ids = IdGenerator::new();
        let tip = ids.next_tip_id();
        let parts: Vec<&str> = tip.as_str().split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "tip");
        assert_eq!(parts[1], "1");
        assert_eq!(parts[3].len(), SUFFIX_LEN);

        let wd = ids.next_withdrawal_id();
        assert!(wd.as_str().starts_with("wd-2-"));
    }

    #[test]
    fn generated_ids_are_unique_across_threads() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || {
                    (0..250).map(|_| ids.next_tip_id()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
