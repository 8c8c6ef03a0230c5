//! Per-key holder with exactly-once population
//!
//! An `ImportSlot` is inserted into the registry empty and is never
//! replaced. Its content goes from empty to populated at most once:
//!
//! ```text
//! 1. check unlocked   - populated? return it
//! 2. take slot lock   - only contends with callers of the SAME key
//! 3. check again      - a racing caller may have won meanwhile
//! 4. build + publish  - OnceCell::set, visible to lock-free readers
//! ```
//!
//! Readers only ever see a fully built `Arc<T>`: the value is constructed
//! before it is published, and `OnceCell` publication is release/acquire.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use txinflow_core::error::Result;

/// Outcome of [`ImportSlot::get_or_try_populate`]
pub(crate) enum Population<T> {
    /// This call built and published the value
    Populated(Arc<T>),
    /// Another caller had already published; its value is returned
    Existing(Arc<T>),
}

impl<T> Population<T> {
    pub(crate) fn into_inner(self) -> Arc<T> {
        match self {
            Population::Populated(v) | Population::Existing(v) => v,
        }
    }
}

/// Holder bound 1:1 to a registry key
pub(crate) struct ImportSlot<T> {
    value: OnceCell<Arc<T>>,
    populate_lock: Mutex<()>,
}

impl<T> ImportSlot<T> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self {
            value: OnceCell::new(),
            populate_lock: Mutex::new(()),
        }
    }

    /// Published value, None while empty or under construction
    pub fn get(&self) -> Option<Arc<T>> {
        self.value.get().cloned()
    }

    /// True once a value has been published
    pub fn is_populated(&self) -> bool {
        self.value.get().is_some()
    }

    /// Return the published value, building it with `build` if empty
    ///
    /// `build` runs at most once per slot across all threads, and only
    /// while holding this slot's lock. If it fails the slot stays empty
    /// and a later call may try again.
    pub(crate) fn get_or_try_populate<F>(&self, build: F) -> Result<Population<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(existing) = self.value.get() {
            return Ok(Population::Existing(Arc::clone(existing)));
        }

        let _guard = self.populate_lock.lock();
        if let Some(existing) = self.value.get() {
            return Ok(Population::Existing(Arc::clone(existing)));
        }

        let built = Arc::new(build()?);
        // Only the lock holder sets, so the cell is still empty here
        let _ = self.value.set(Arc::clone(&built));
        Ok(Population::Populated(built))
    }
}

impl<T> Default for ImportSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ImportSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportSlot")
            .field("populated", &self.is_populated())
            .finish()
    }
}
