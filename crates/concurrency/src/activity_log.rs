//! In-memory activity log
//!
//! Process-local `ActivityLog`. Records survive for the lifetime of the
//! log instance, which is enough to drive recovery in tests and in
//! embedded setups that persist elsewhere.

use parking_lot::RwLock;
use std::collections::HashMap;
use txinflow_core::error::Result;
use txinflow_core::record::ActivityRecord;
use txinflow_core::traits::ActivityLog;
use txinflow_core::types::ActivityId;

/// `ActivityLog` backed by a `HashMap` under a `RwLock`
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    records: RwLock<HashMap<ActivityId, ActivityRecord>>,
}

impl InMemoryActivityLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True if no records are stored
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ActivityLog for InMemoryActivityLog {
    fn write(&self, record: ActivityRecord) -> Result<()> {
        self.records.write().insert(record.activity_id, record);
        Ok(())
    }

    fn read(&self, activity_id: &ActivityId) -> Result<Option<ActivityRecord>> {
        Ok(self.records.read().get(activity_id).cloned())
    }

    fn remove(&self, activity_id: &ActivityId) -> Result<()> {
        self.records.write().remove(activity_id);
        Ok(())
    }

    fn activities(&self) -> Result<Vec<ActivityId>> {
        Ok(self.records.read().keys().copied().collect())
    }
}
