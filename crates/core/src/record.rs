//! Durable activity records
//!
//! An activity record is what survives a crash for one subordinate
//! transaction: its activity id, the global transaction it was imported
//! under (when it was known at the time of the write), its timeout and
//! its last written status.

use crate::types::{ActivityId, Xid};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a subordinate transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    /// Imported and doing work
    Active,
    /// Voted to commit, waiting for the superior's decision
    Prepared,
    /// Committed (terminal)
    Committed,
    /// Rolled back (terminal)
    RolledBack,
}

impl TxStatus {
    /// Returns true if the transaction can be prepared.
    pub fn can_prepare(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the transaction can be committed.
    ///
    /// `Active` is allowed for one-phase commit.
    pub fn can_commit(&self) -> bool {
        matches!(self, Self::Active | Self::Prepared)
    }

    /// Returns true if the transaction can be rolled back.
    pub fn can_rollback(&self) -> bool {
        matches!(self, Self::Active | Self::Prepared)
    }

    /// Returns true if the transaction is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::Active => "Active",
            TxStatus::Prepared => "Prepared",
            TxStatus::Committed => "Committed",
            TxStatus::RolledBack => "RolledBack",
        };
        f.write_str(s)
    }
}

/// Durable state of one subordinate transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Record identifier
    pub activity_id: ActivityId,
    /// Global transaction the activity belongs to, if correlated yet
    pub xid: Option<Xid>,
    /// Timeout in seconds (0 = none)
    pub timeout_secs: u32,
    /// Last written status
    pub status: TxStatus,
}

impl ActivityRecord {
    /// Create a record for an activity
    pub fn new(
        activity_id: ActivityId,
        xid: Option<Xid>,
        timeout_secs: u32,
        status: TxStatus,
    ) -> Self {
        Self {
            activity_id,
            xid,
            timeout_secs,
            status,
        }
    }
}
