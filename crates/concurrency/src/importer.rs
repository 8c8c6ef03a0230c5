//! Transaction import registry
//!
//! Associates each inbound global transaction identifier with exactly one
//! local subordinate transaction, under concurrent access from resource
//! managers, recovery workers and terminators.
//!
//! ## Structure
//!
//! ```text
//! DashMap<Xid, Arc<ImportSlot<T>>>
//!           │          │
//!           │          └─ populated at most once, per-slot lock
//!           └─ insert-if-absent, shard-level locking only
//! ```
//!
//! Map guards are never held while a transaction is being built or
//! reconciled: the slot `Arc` is cloned out first, so a slow construction
//! for one Xid does not stall other keys that hash to the same shard.
//!
//! ## Visibility
//!
//! A slot that exists but is still empty is reported as absent by
//! [`TransactionImporter::lookup`]. A transaction only becomes observable
//! once it is fully built and published.

use crate::config::ImporterConfig;
use crate::slot::{ImportSlot, Population};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use txinflow_core::error::{Error, Result};
use txinflow_core::traits::{Subordinate, SubordinateFactory};
use txinflow_core::types::{ActivityId, Xid};

type Slot<F> = Arc<ImportSlot<<F as SubordinateFactory>::Transaction>>;

/// Registry of imported subordinate transactions
///
/// Constructed once at coordinator startup and shared by `Arc` with every
/// caller; there is no process-wide instance.
///
/// # Guarantees
///
/// - At most one live transaction per Xid
/// - A slot is never replaced, only populated once
/// - Callers never observe a transaction under construction
/// - Operations on distinct Xids never block each other
pub struct TransactionImporter<F: SubordinateFactory> {
    factory: F,
    slots: DashMap<Xid, Slot<F>>,
    config: ImporterConfig,
}

impl<F: SubordinateFactory> TransactionImporter<F> {
    /// Create a registry with the default configuration
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            slots: DashMap::new(),
            config: ImporterConfig::default(),
        }
    }

    /// Create a registry sized and tuned by `config`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the config does not validate.
    pub fn with_config(factory: F, config: ImporterConfig) -> Result<Self> {
        config.validate()?;
        let slots = match config.shard_amount {
            Some(shards) => {
                DashMap::with_capacity_and_shard_amount(config.initial_capacity, shards)
            }
            None => DashMap::with_capacity(config.initial_capacity),
        };
        Ok(Self {
            factory,
            slots,
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    /// Collaborator used to build transactions
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Import with the configured default timeout
    ///
    /// See [`Self::import_transaction`].
    pub fn import_transaction_default(&self, xid: &Xid) -> Result<Arc<F::Transaction>> {
        self.import_transaction(xid, self.config.default_timeout_secs)
    }

    /// Get or create the subordinate transaction for an inflowed Xid
    ///
    /// Concurrent importers of the same Xid all receive the same instance;
    /// the factory is called at most once per slot. The timeout of a call
    /// that finds the slot already populated is ignored. A timeout of 0
    /// means no explicit timeout.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `xid` is null
    /// - any factory error, unchanged; the slot stays empty
    pub fn import_transaction(&self, xid: &Xid, timeout_secs: u32) -> Result<Arc<F::Transaction>> {
        check_xid(xid)?;

        let slot = self.slot_for(xid);
        let population = slot.get_or_try_populate(|| self.factory.create(xid, timeout_secs))?;

        match &population {
            Population::Populated(_) => {
                debug!(target: "txinflow::import", xid = %xid, timeout_secs, "Imported transaction")
            }
            Population::Existing(_) => {
                debug!(target: "txinflow::import", xid = %xid, "Reusing imported transaction")
            }
        }
        Ok(population.into_inner())
    }

    /// Rebuild a transaction from its durable record and register it
    ///
    /// If the Xid's slot is already populated (typically by a live import
    /// that ran first) that instance wins and the rebuilt one is dropped.
    /// `record_for_tracking` is called only on a rebuilt instance that wins.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `activity_id` is nil, or the rebuilt
    ///   transaction has no resolvable base Xid
    /// - any factory error, unchanged
    pub fn recover_transaction(&self, activity_id: &ActivityId) -> Result<Arc<F::Transaction>> {
        self.recover_and_register(activity_id).map(Population::into_inner)
    }

    pub(crate) fn recover_and_register(
        &self,
        activity_id: &ActivityId,
    ) -> Result<Population<F::Transaction>> {
        if activity_id.is_nil() {
            return Err(Error::invalid_argument("activity id is nil"));
        }

        let recovered = self.factory.reconstruct(activity_id)?;
        let xid = match recovered.base_xid() {
            Some(xid) if !xid.is_null() => xid,
            _ => {
                return Err(Error::invalid_argument(format!(
                    "activity {} has no resolvable global transaction",
                    activity_id
                )))
            }
        };

        let slot = self.slot_for(&xid);
        let population = slot.get_or_try_populate(move || {
            recovered.record_for_tracking();
            Ok(recovered)
        })?;

        match &population {
            Population::Populated(_) => info!(
                target: "txinflow::import",
                xid = %xid,
                activity_id = %activity_id,
                "Registered recovered transaction"
            ),
            Population::Existing(_) => info!(
                target: "txinflow::import",
                xid = %xid,
                activity_id = %activity_id,
                "Transaction already imported, discarding recovered copy"
            ),
        }
        Ok(population)
    }

    /// Find the transaction imported under `xid`
    ///
    /// Returns `Ok(None)` when there is no slot, or when the slot is still
    /// being populated. A transaction without a resolved base Xid gets one
    /// more `attempt_recovery` pass before it is handed out.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `xid` is null
    /// - `RetryableRecovery` if the reconciliation pass did not resolve the
    ///   base Xid; retry the lookup later
    pub fn lookup(&self, xid: &Xid) -> Result<Option<Arc<F::Transaction>>> {
        check_xid(xid)?;

        let slot = match self.slots.get(xid) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(None),
        };

        let txn = match slot.get() {
            Some(txn) => txn,
            None => {
                debug!(target: "txinflow::import", xid = %xid, "Transaction still being imported");
                return Ok(None);
            }
        };

        if txn.base_xid().is_none() {
            if let Err(e) = txn.attempt_recovery() {
                warn!(
                    target: "txinflow::import",
                    xid = %xid,
                    error = %e,
                    "Recovery of imported transaction failed"
                );
                return Err(Error::RetryableRecovery { xid: xid.clone() });
            }
            if txn.base_xid().is_none() {
                warn!(target: "txinflow::import", xid = %xid, "Recovery left base xid unresolved");
                return Err(Error::RetryableRecovery { xid: xid.clone() });
            }
        }

        Ok(Some(txn))
    }

    /// Drop the slot for `xid`, populated or not
    ///
    /// The caller decides when a transaction's lifecycle is over; removing
    /// while an import of the same Xid is still in flight is not guarded
    /// against. A later import creates a brand new instance.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `xid` is null.
    pub fn remove_transaction(&self, xid: &Xid) -> Result<()> {
        check_xid(xid)?;
        let removed = self.slots.remove(xid).is_some();
        debug!(target: "txinflow::import", xid = %xid, removed, "Removed imported transaction");
        Ok(())
    }

    /// True if a populated slot exists for `xid`
    ///
    /// Does not run reconciliation; a null Xid is never contained.
    pub fn contains(&self, xid: &Xid) -> bool {
        self.slots
            .get(xid)
            .map(|entry| entry.value().is_populated())
            .unwrap_or(false)
    }

    /// Number of slots, including ones still being populated
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no slots exist
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Xids whose slots are populated, in no particular order
    pub fn xids(&self) -> Vec<Xid> {
        self.slots
            .iter()
            .filter(|entry| entry.value().is_populated())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Existing slot for `xid`, or a fresh empty one inserted atomically
    fn slot_for(&self, xid: &Xid) -> Slot<F> {
        if let Some(entry) = self.slots.get(xid) {
            return Arc::clone(entry.value());
        }
        let entry = self
            .slots
            .entry(xid.clone())
            .or_insert_with(|| Arc::new(ImportSlot::new()));
        Arc::clone(entry.value())
    }
}

fn check_xid(xid: &Xid) -> Result<()> {
    if xid.is_null() {
        return Err(Error::invalid_argument("xid is null"));
    }
    Ok(())
}
