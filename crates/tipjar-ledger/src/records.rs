use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tipjar_types::{Address, Amount, TipId, WithdrawalId};

use crate::error::LedgerError;

/// BLAKE3 digest linking ledger entries into a hash chain.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest([u8; 32]);

impl Digest {
    pub const ZERO: Self = Self([0; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl TryFrom<String> for Digest {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let bytes = hex::decode(&value).map_err(|e| e.to_string())?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("expected 32 bytes, got {}", b.len()))?;
        Ok(Self(arr))
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_hex()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A tip submitted for recording.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTip {
    pub recipient: Address,
    pub sender: Address,
    pub amount: Amount,
    /// Free-text item identifier, e.g. the tipped track link.
    pub reference: String,
    /// Transaction id returned by the wallet/chain collaborator, if any.
    pub external_tx_id: Option<TipId>,
}

/// A recorded tip. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipEvent {
    pub id: TipId,
    pub seq: u64,
    pub recipient: Address,
    pub sender: Address,
    pub amount: Amount,
    pub reference: String,
    pub recorded_at: DateTime<Utc>,
    pub prev_digest: Option<Digest>,
    pub digest: Digest,
}

/// A recorded withdrawal. Shares the tip sequence and hash chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalEvent {
    pub id: WithdrawalId,
    pub seq: u64,
    pub recipient: Address,
    pub amount: Amount,
    pub recorded_at: DateTime<Utc>,
    pub prev_digest: Option<Digest>,
    pub digest: Digest,
}

/// Outcome of a successful withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub withdrawal: WithdrawalEvent,
    pub remaining_balance: Amount,
}

/// Discriminant for ledger entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Tip,
    Withdrawal,
}

/// A single position in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    Tip(TipEvent),
    Withdrawal(WithdrawalEvent),
}

impl LedgerEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Tip(_) => EntryKind::Tip,
            Self::Withdrawal(_) => EntryKind::Withdrawal,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            Self::Tip(t) => t.seq,
            Self::Withdrawal(w) => w.seq,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Tip(t) => t.id.as_str(),
            Self::Withdrawal(w) => w.id.as_str(),
        }
    }

    pub fn recipient(&self) -> &Address {
        match self {
            Self::Tip(t) => &t.recipient,
            Self::Withdrawal(w) => &w.recipient,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Self::Tip(t) => t.amount,
            Self::Withdrawal(w) => w.amount,
        }
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        match self {
            Self::Tip(t) => t.recorded_at,
            Self::Withdrawal(w) => w.recorded_at,
        }
    }

    pub fn prev_digest(&self) -> Option<Digest> {
        match self {
            Self::Tip(t) => t.prev_digest,
            Self::Withdrawal(w) => w.prev_digest,
        }
    }

    pub fn digest(&self) -> Digest {
        match self {
            Self::Tip(t) => t.digest,
            Self::Withdrawal(w) => w.digest,
        }
    }

    pub fn set_digest(&mut self, digest: Digest) {
        match self {
            Self::Tip(t) => t.digest = digest,
            Self::Withdrawal(w) => w.digest = digest,
        }
    }

    pub fn as_tip(&self) -> Option<&TipEvent> {
        match self {
            Self::Tip(t) => Some(t),
            Self::Withdrawal(_) => None,
        }
    }

    pub fn as_withdrawal(&self) -> Option<&WithdrawalEvent> {
        match self {
            Self::Withdrawal(w) => Some(w),
            Self::Tip(_) => None,
        }
    }

    /// Digest of this entry with its own `digest` field zeroed.
    pub fn compute_digest(&self) -> Result<Digest, LedgerError> {
        let mut canonical = self.clone();
        canonical.set_digest(Digest::ZERO);

        let encoded = serde_json::to_vec(&canonical)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(b"tipjar-entry-v1:");
        hasher.update(&encoded);
        Ok(Digest(*hasher.finalize().as_bytes()))
    }
}

/// Which side of a tip an address is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sender,
    Recipient,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sender" | "from" => Ok(Self::Sender),
            "recipient" | "to" => Ok(Self::Recipient),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Recipient => f.write_str("recipient"),
        }
    }
}
