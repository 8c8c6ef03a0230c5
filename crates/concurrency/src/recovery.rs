//! Recovery scan over an activity log
//!
//! After a restart the recovery subsystem walks every durable activity
//! record and hands it to [`TransactionImporter::recover_transaction`].
//! Live imports may already be running at that point; the registry's
//! slot discipline makes the two paths converge on one instance.
//!
//! ## Scan Procedure
//!
//! 1. List activity ids from the log
//! 2. Recover each one through the registry
//! 3. Count outcomes; a failing record never stops the scan

use crate::importer::TransactionImporter;
use crate::slot::Population;
use tracing::{info, warn};
use txinflow_core::error::{Error, Result};
use txinflow_core::traits::{ActivityLog, SubordinateFactory};

/// Coordinates a recovery pass of one activity log into one registry
pub struct RecoveryCoordinator<'a, F: SubordinateFactory> {
    importer: &'a TransactionImporter<F>,
    log: &'a dyn ActivityLog,
}

impl<'a, F: SubordinateFactory> RecoveryCoordinator<'a, F> {
    /// Create a coordinator for `log` feeding `importer`
    pub fn new(importer: &'a TransactionImporter<F>, log: &'a dyn ActivityLog) -> Self {
        Self { importer, log }
    }

    /// Recover every record in the log
    ///
    /// # Errors
    ///
    /// Only if the log cannot list its records. Per-record failures are
    /// counted in the returned stats.
    pub fn recover(&self) -> Result<RecoveryStats> {
        let mut stats = RecoveryStats::default();

        for activity_id in self.log.activities()? {
            match self.importer.recover_and_register(&activity_id) {
                Ok(Population::Populated(_)) => stats.registered += 1,
                Ok(Population::Existing(_)) => stats.already_imported += 1,
                Err(Error::InvalidArgument(_)) => {
                    warn!(
                        target: "txinflow::recovery",
                        activity_id = %activity_id,
                        "Activity not correlated with a global transaction"
                    );
                    stats.unresolved += 1;
                }
                Err(e) => {
                    warn!(
                        target: "txinflow::recovery",
                        activity_id = %activity_id,
                        error = %e,
                        "Activity recovery failed"
                    );
                    stats.failed += 1;
                }
            }
        }

        info!(
            target: "txinflow::recovery",
            registered = stats.registered,
            already_imported = stats.already_imported,
            unresolved = stats.unresolved,
            failed = stats.failed,
            "Recovery scan complete"
        );
        Ok(stats)
    }
}

/// Statistics from a recovery scan
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Records whose rebuilt transaction now owns its slot
    pub registered: usize,

    /// Records whose Xid was already imported live; the rebuilt copy was dropped
    pub already_imported: usize,

    /// Records without a resolvable Xid
    pub unresolved: usize,

    /// Records the factory could not rebuild
    pub failed: usize,
}

impl RecoveryStats {
    /// Total records visited
    pub fn total(&self) -> usize {
        self.registered + self.already_imported + self.unresolved + self.failed
    }
}
