//! Concurrency layer for txinflow
//!
//! This crate implements the subordinate-transaction import registry:
//! - TransactionImporter: Xid -> transaction map with exactly-once slot population
//! - SubordinateTransaction: Log-backed transaction with imported/recovered origins
//! - RecoveryCoordinator: Feeds durable activity records back into the registry
//! - ImporterConfig: `importer.toml` settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activity_log;
pub mod config;
pub mod importer;
pub mod recovery;
mod slot;
pub mod subordinate;

pub use activity_log::InMemoryActivityLog;
pub use config::{ImporterConfig, CONFIG_FILE_NAME};
pub use importer::TransactionImporter;
pub use recovery::{RecoveryCoordinator, RecoveryStats};
pub use subordinate::{LoggedSubordinateFactory, Origin, SubordinateTransaction};
