//! Log-backed subordinate transaction
//!
//! One type covers both ways a subordinate comes to exist, tagged by
//! [`Origin`]:
//!
//! - `Imported`: built by a live import, base Xid known up front
//! - `Recovered`: rebuilt from an activity record after a crash; the base
//!   Xid is whatever the record holds, possibly nothing yet
//!
//! ## Status machine
//!
//! ```text
//! Active ──prepare──► Prepared ──commit──► Committed
//!   │                    │
//!   ├──commit (1PC)──────┼──────────────► Committed
//!   └──rollback──────────┴──rollback───► RolledBack
//! ```
//!
//! `prepare` writes the activity record; reaching a terminal status
//! removes it.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use txinflow_core::error::{Error, Result};
use txinflow_core::record::{ActivityRecord, TxStatus};
use txinflow_core::traits::{ActivityLog, Subordinate, SubordinateFactory};
use txinflow_core::types::{ActivityId, Xid};

/// How a subordinate transaction came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Built for a live import
    Imported,
    /// Rebuilt from a durable activity record
    Recovered,
}

/// Subordinate transaction persisting through an [`ActivityLog`]
pub struct SubordinateTransaction {
    activity_id: ActivityId,
    origin: Origin,
    timeout_secs: u32,
    base_xid: RwLock<Option<Xid>>,
    status: Mutex<TxStatus>,
    tracked: AtomicBool,
    log: Arc<dyn ActivityLog>,
}

impl SubordinateTransaction {
    /// Fresh transaction for a live import; writes nothing
    pub fn imported(xid: Xid, timeout_secs: u32, log: Arc<dyn ActivityLog>) -> Self {
        Self {
            activity_id: ActivityId::new(),
            origin: Origin::Imported,
            timeout_secs,
            base_xid: RwLock::new(Some(xid)),
            status: Mutex::new(TxStatus::Active),
            tracked: AtomicBool::new(false),
            log,
        }
    }

    /// Rebuild from the record `activity_id`
    ///
    /// # Errors
    ///
    /// `CollaboratorFailure` if the log has no such record, or the log
    /// read fails.
    pub fn recovered(activity_id: ActivityId, log: Arc<dyn ActivityLog>) -> Result<Self> {
        let record = log.read(&activity_id)?.ok_or_else(|| {
            Error::collaborator(format!("no activity record for {}", activity_id))
        })?;

        Ok(Self {
            activity_id,
            origin: Origin::Recovered,
            timeout_secs: record.timeout_secs,
            base_xid: RwLock::new(record.xid),
            status: Mutex::new(record.status),
            tracked: AtomicBool::new(false),
            log,
        })
    }

    /// Durable record identifier
    pub fn activity_id(&self) -> ActivityId {
        self.activity_id
    }

    /// Construction path
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Current status
    pub fn status(&self) -> TxStatus {
        *self.status.lock()
    }

    /// True once the registry has taken ownership after recovery
    pub fn is_tracked(&self) -> bool {
        self.tracked.load(Ordering::Acquire)
    }

    /// Phase one: persist the activity and move to `Prepared`
    pub fn prepare(&self) -> Result<()> {
        let mut status = self.status.lock();
        if !status.can_prepare() {
            return Err(invalid_transition(*status, TxStatus::Prepared));
        }
        self.log.write(ActivityRecord::new(
            self.activity_id,
            self.base_xid.read().clone(),
            self.timeout_secs,
            TxStatus::Prepared,
        ))?;
        *status = TxStatus::Prepared;
        debug!(target: "txinflow::subordinate", activity_id = %self.activity_id, "Prepared");
        Ok(())
    }

    /// Commit; from `Active` this is a one-phase commit
    pub fn commit(&self) -> Result<()> {
        let mut status = self.status.lock();
        if !status.can_commit() {
            return Err(invalid_transition(*status, TxStatus::Committed));
        }
        self.log.remove(&self.activity_id)?;
        *status = TxStatus::Committed;
        debug!(target: "txinflow::subordinate", activity_id = %self.activity_id, "Committed");
        Ok(())
    }

    /// Roll back from `Active` or `Prepared`
    pub fn rollback(&self) -> Result<()> {
        let mut status = self.status.lock();
        if !status.can_rollback() {
            return Err(invalid_transition(*status, TxStatus::RolledBack));
        }
        self.log.remove(&self.activity_id)?;
        *status = TxStatus::RolledBack;
        debug!(target: "txinflow::subordinate", activity_id = %self.activity_id, "Rolled back");
        Ok(())
    }
}

fn invalid_transition(from: TxStatus, to: TxStatus) -> Error {
    Error::InvalidState {
        from: from.to_string(),
        to: to.to_string(),
    }
}

impl Subordinate for SubordinateTransaction {
    fn base_xid(&self) -> Option<Xid> {
        self.base_xid.read().clone()
    }

    fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    fn attempt_recovery(&self) -> Result<()> {
        if self.base_xid.read().is_some() {
            return Ok(());
        }

        let record = self.log.read(&self.activity_id)?.ok_or_else(|| {
            Error::collaborator(format!("activity record {} disappeared", self.activity_id))
        })?;
        match record.xid {
            Some(xid) => {
                *self.base_xid.write() = Some(xid);
                Ok(())
            }
            None => Err(Error::collaborator(format!(
                "activity {} is not correlated with a global transaction yet",
                self.activity_id
            ))),
        }
    }

    fn record_for_tracking(&self) {
        self.tracked.store(true, Ordering::Release);
        debug!(
            target: "txinflow::subordinate",
            activity_id = %self.activity_id,
            "Tracked by import registry"
        );
    }
}

impl fmt::Debug for SubordinateTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base_xid = self.base_xid.read().clone();
        let status = self.status();
        f.debug_struct("SubordinateTransaction")
            .field("activity_id", &self.activity_id)
            .field("origin", &self.origin)
            .field("timeout_secs", &self.timeout_secs)
            .field("base_xid", &base_xid)
            .field("status", &status)
            .finish()
    }
}

/// Factory producing [`SubordinateTransaction`]s over a shared log
#[derive(Clone)]
pub struct LoggedSubordinateFactory {
    log: Arc<dyn ActivityLog>,
}

impl LoggedSubordinateFactory {
    /// Create a factory writing to `log`
    pub fn new(log: Arc<dyn ActivityLog>) -> Self {
        Self { log }
    }

    /// The log transactions persist to
    pub fn log(&self) -> &Arc<dyn ActivityLog> {
        &self.log
    }
}

impl SubordinateFactory for LoggedSubordinateFactory {
    type Transaction = SubordinateTransaction;

    fn create(&self, xid: &Xid, timeout_secs: u32) -> Result<SubordinateTransaction> {
        Ok(SubordinateTransaction::imported(
            xid.clone(),
            timeout_secs,
            Arc::clone(&self.log),
        ))
    }

    fn reconstruct(&self, activity_id: &ActivityId) -> Result<SubordinateTransaction> {
        SubordinateTransaction::recovered(*activity_id, Arc::clone(&self.log))
    }
}
