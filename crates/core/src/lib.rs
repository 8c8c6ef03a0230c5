//! Core types and traits for txinflow
//!
//! This crate defines the foundational types used throughout the system:
//! - Xid: Global transaction identifier (registry key)
//! - ActivityId: Durable activity record identifier
//! - ActivityRecord / TxStatus: What a subordinate transaction persists
//! - Error: Error type hierarchy
//! - Traits: Collaborator contracts (Subordinate, SubordinateFactory, ActivityLog)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod record;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use record::{ActivityRecord, TxStatus};
pub use traits::{ActivityLog, Subordinate, SubordinateFactory};
pub use types::{ActivityId, Xid};
