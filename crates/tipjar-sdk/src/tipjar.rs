use serde::{Deserialize, Serialize};
use tipjar_ledger::{
    ConsistencyReport, GlobalStats, NewTip, RecipientStats, Role, TipEvent, TipPool,
    TopRecipient, WithdrawalReceipt,
};
use tipjar_registry::{InMemoryRegistry, RegistryEntry, RegistryStore, Resolution};
use tipjar_types::{Address, AddressValidator, Amount, TipId};

use crate::config::TipJarConfig;
use crate::error::{SdkError, SdkResult};
use crate::snapshot::LedgerSnapshot;

/// A tip as submitted by a wallet integration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipRequest {
    pub recipient: String,
    pub sender: String,
    pub amount: Amount,
    #[serde(default)]
    pub reference: String,
    /// Transaction id reported by the wallet, used as the tip id.
    #[serde(default)]
    pub external_tx_id: Option<String>,
}

/// High-level Tipjar API.
///
/// Owns one registry and one tip pool. All methods take `&self`; share a
/// `TipJar` across threads with `Arc`.
#[derive(Debug)]
pub struct TipJar {
    config: TipJarConfig,
    registry: InMemoryRegistry,
    pool: TipPool,
}

impl Default for TipJar {
    fn default() -> Self {
        Self::new(TipJarConfig::default())
    }
}

impl TipJar {
    pub fn new(config: TipJarConfig) -> Self {
        let registry = InMemoryRegistry::new(config.asset)
            .with_policy(config.ref_policy())
            .with_fuzzy_resolution(config.fuzzy_resolution);
        Self {
            config,
            registry,
            pool: TipPool::new(),
        }
    }

    /// Rebuild a `TipJar` from an exported snapshot.
    ///
    /// Registrations are re-validated against `config`, ledger entries are
    /// re-verified against the hash chain, and every aggregate is replayed.
    pub fn import(config: TipJarConfig, snapshot: &LedgerSnapshot) -> SdkResult<Self> {
        if snapshot.asset != config.asset {
            return Err(SdkError::Snapshot(format!(
                "snapshot is for {}, configured asset is {}",
                snapshot.asset, config.asset
            )));
        }

        let jar = Self::new(config);
        for entry in &snapshot.recipients {
            jar.registry.restore(entry)?;
        }
        if jar.config.strict_addresses {
            for entry in &snapshot.entries {
                jar.address(entry.recipient().as_str())?;
                if let Some(tip) = entry.as_tip() {
                    jar.address(tip.sender.as_str())?;
                }
            }
        }
        jar.pool.restore(&snapshot.entries)?;

        tracing::info!(
            recipients = snapshot.recipients.len(),
            entries = snapshot.entries.len(),
            asset = %snapshot.asset,
            "snapshot imported"
        );
        Ok(jar)
    }

    pub fn config(&self) -> &TipJarConfig {
        &self.config
    }

    // ---- Registry ----

    pub fn register_recipient(
        &self,
        external_ref: &str,
        payout_address: &str,
    ) -> SdkResult<RegistryEntry> {
        Ok(self.registry.register(external_ref, payout_address)?)
    }

    /// Resolve with the fuzzy fallback. Check [`Resolution::basis`] before
    /// trusting the result.
    pub fn resolve_recipient(&self, external_ref: &str) -> SdkResult<Resolution> {
        Ok(self.registry.resolve(external_ref)?)
    }

    pub fn resolve_recipient_exact(&self, external_ref: &str) -> SdkResult<Address> {
        Ok(self.registry.resolve_exact(external_ref)?)
    }

    pub fn recipients(&self) -> SdkResult<Vec<RegistryEntry>> {
        Ok(self.registry.entries()?)
    }

    pub fn is_registered_payout(&self, address: &str) -> SdkResult<bool> {
        Ok(self.registry.is_payout_address(address)?)
    }

    // ---- Tips and withdrawals ----

    pub fn submit_tip(&self, request: TipRequest) -> SdkResult<TipEvent> {
        let external_tx_id = request
            .external_tx_id
            .map(TipId::external)
            .transpose()
            .map_err(SdkError::TransactionId)?;
        let tip = NewTip {
            recipient: self.address(&request.recipient)?,
            sender: self.address(&request.sender)?,
            amount: request.amount,
            reference: request.reference,
            external_tx_id,
        };
        Ok(self.pool.record(tip)?)
    }

    /// Tip the creator registered under `external_ref`.
    ///
    /// Only an exact registration is accepted; the reference recorded on the
    /// tip is `external_ref` itself.
    pub fn tip_by_reference(
        &self,
        external_ref: &str,
        sender: &str,
        amount: Amount,
        external_tx_id: Option<&str>,
    ) -> SdkResult<TipEvent> {
        let recipient = self.registry.resolve_exact(external_ref)?;
        self.submit_tip(TipRequest {
            recipient: recipient.to_string(),
            sender: sender.to_string(),
            amount,
            reference: external_ref.to_string(),
            external_tx_id: external_tx_id.map(str::to_string),
        })
    }

    pub fn withdraw(&self, recipient: &str, amount: Amount) -> SdkResult<WithdrawalReceipt> {
        let recipient = self.address(recipient)?;
        Ok(self.pool.withdraw(&recipient, amount)?)
    }

    // ---- Queries ----

    pub fn get_balance(&self, recipient: &str) -> SdkResult<Amount> {
        Ok(self.pool.balance_of(&Address::parse(recipient)?)?)
    }

    pub fn get_stats(&self, recipient: &str) -> SdkResult<RecipientStats> {
        Ok(self.pool.stats_of(&Address::parse(recipient)?)?)
    }

    pub fn get_global_stats(&self) -> SdkResult<GlobalStats> {
        Ok(self.pool.global_stats()?)
    }

    /// Top recipients by lifetime tips; `None` uses the configured default.
    pub fn get_top_recipients(&self, limit: Option<usize>) -> SdkResult<Vec<TopRecipient>> {
        let limit = limit.unwrap_or(self.config.default_top_limit);
        Ok(self.pool.top_recipients(limit)?)
    }

    pub fn transactions_for(&self, address: &str, role: Role) -> SdkResult<Vec<TipEvent>> {
        Ok(self.pool.transactions_for(&Address::parse(address)?, role)?)
    }

    // ---- Persistence and integrity ----

    pub fn export(&self) -> SdkResult<LedgerSnapshot> {
        Ok(LedgerSnapshot::new(
            self.config.asset,
            self.registry.entries()?,
            self.pool.entries()?,
        ))
    }

    pub fn verify(&self) -> SdkResult<ConsistencyReport> {
        Ok(self.pool.verify()?)
    }

    pub fn pool(&self) -> &TipPool {
        &self.pool
    }

    /// Parse an address used to move value, honoring `strict_addresses`.
    fn address(&self, raw: &str) -> SdkResult<Address> {
        if self.config.strict_addresses {
            Ok(self.config.asset.validate(raw)?)
        } else {
            Ok(Address::parse(raw)?)
        }
    }
}
