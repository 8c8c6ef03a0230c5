//! Collaborator traits for the import registry
//!
//! The registry never builds or recovers a transaction itself. It talks to
//! a [`SubordinateFactory`] for construction and to the produced
//! [`Subordinate`] for reconciliation, so the transaction protocol and its
//! logging can be swapped without touching the slot logic.

use crate::error::Result;
use crate::record::ActivityRecord;
use crate::types::{ActivityId, Xid};

/// Local representative of an inflowed global transaction
///
/// Instances are shared between threads behind an `Arc`, so every method
/// takes `&self`; implementations use interior mutability for the state
/// that `attempt_recovery` resolves.
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Subordinate: Send + Sync {
    /// The global transaction this subordinate was imported under
    ///
    /// None for a transaction rebuilt from a durable record whose
    /// identifier has not been correlated yet.
    fn base_xid(&self) -> Option<Xid>;

    /// Timeout in seconds; 0 means no explicit timeout
    fn timeout_secs(&self) -> u32;

    /// Try to resolve the base identifier from durable state
    ///
    /// # Errors
    ///
    /// Failure is transient: the same call may succeed later.
    fn attempt_recovery(&self) -> Result<()>;

    /// Told once, on the instance that wins registration after recovery
    fn record_for_tracking(&self);
}

/// Builds subordinate transactions on behalf of the registry
pub trait SubordinateFactory: Send + Sync {
    /// Transaction type produced by this factory
    type Transaction: Subordinate;

    /// Build a fresh transaction for a live import
    ///
    /// Pure construction; must not require durable side effects to succeed.
    fn create(&self, xid: &Xid, timeout_secs: u32) -> Result<Self::Transaction>;

    /// Rebuild a transaction from the durable record `activity_id`
    ///
    /// The result may not have a resolved base identifier yet.
    fn reconstruct(&self, activity_id: &ActivityId) -> Result<Self::Transaction>;
}

/// Durable store of activity records
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait ActivityLog: Send + Sync {
    /// Write (or overwrite) a record
    fn write(&self, record: ActivityRecord) -> Result<()>;

    /// Read a record, None if absent
    fn read(&self, activity_id: &ActivityId) -> Result<Option<ActivityRecord>>;

    /// Remove a record; removing an absent record is not an error
    fn remove(&self, activity_id: &ActivityId) -> Result<()>;

    /// Ids of every stored record
    fn activities(&self) -> Result<Vec<ActivityId>>;
}
