use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tipjar_ledger::LedgerEntry;
use tipjar_registry::RegistryEntry;
use tipjar_types::AssetKind;

use crate::error::{SdkError, SdkResult};

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Portable copy of a [`TipJar`](crate::TipJar)'s durable state.
///
/// Only registrations and ledger entries are stored; aggregates are rebuilt
/// on import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    pub asset: AssetKind,
    pub exported_at: DateTime<Utc>,
    pub recipients: Vec<RegistryEntry>,
    pub entries: Vec<LedgerEntry>,
}

impl LedgerSnapshot {
    pub fn new(asset: AssetKind, recipients: Vec<RegistryEntry>, entries: Vec<LedgerEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            asset,
            exported_at: Utc::now(),
            recipients,
            entries,
        }
    }

    pub fn to_json_pretty(&self) -> SdkResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> SdkResult<Self> {
        let snapshot: Self = serde_json::from_str(input)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SdkError::Snapshot(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SdkResult<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}
