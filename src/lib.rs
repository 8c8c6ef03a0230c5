//! txinflow - Subordinate transaction import registry
//!
//! Associates an inbound global transaction identifier (`Xid`) with exactly
//! one locally owned subordinate transaction, safely under concurrent access
//! from resource managers, recovery workers and terminators.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use txinflow::{InMemoryActivityLog, LoggedSubordinateFactory, TransactionImporter, Xid};
//!
//! let log = Arc::new(InMemoryActivityLog::new());
//! let importer = TransactionImporter::new(LoggedSubordinateFactory::new(log));
//!
//! let xid = Xid::new(0, b"global-txn", b"branch-1")?;
//! let txn = importer.import_transaction(&xid, 30)?;
//! assert!(importer.lookup(&xid)?.is_some());
//! importer.remove_transaction(&xid)?;
//! ```
//!
//! # Architecture
//!
//! - `txinflow-core`: identifiers, errors, activity records, collaborator traits
//! - `txinflow-concurrency`: the registry, its slots, config, recovery scan,
//!   and the bundled log-backed subordinate transaction

pub use txinflow_concurrency::*;
pub use txinflow_core::*;
