//! Import registry scenario tests
//!
//! End-to-end flows through the public API:
//!
//! 1. **Lifecycle** - import, re-import, lookup, remove, re-import
//! 2. **Reconciliation** - unresolved recovered stubs and the retry contract
//! 3. **Failure isolation** - failed construction leaves the slot reusable
//! 4. **Model check** - random operation sequences against a reference map
//!
//! ## Running These Tests
//!
//! ```bash
//! cargo test --test import_scenarios
//! ```

use parking_lot::RwLock;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use txinflow_concurrency::{InMemoryActivityLog, LoggedSubordinateFactory, TransactionImporter};
use txinflow_core::record::TxStatus;
use txinflow_core::traits::{Subordinate, SubordinateFactory};
use txinflow_core::types::{ActivityId, Xid};
use txinflow_core::{Error, Result};

// ============================================================================
// Test Helpers
// ============================================================================

fn create_importer() -> TransactionImporter<LoggedSubordinateFactory> {
    TransactionImporter::new(LoggedSubordinateFactory::new(Arc::new(
        InMemoryActivityLog::new(),
    )))
}

fn create_xid(name: &str) -> Xid {
    Xid::new(7, name.as_bytes(), b"").unwrap()
}

/// Transaction that starts unresolved and resolves after `failures` failed
/// recovery attempts
#[derive(Debug)]
struct FlakyTxn {
    target: Xid,
    base: RwLock<Option<Xid>>,
    failures: usize,
    attempts: AtomicUsize,
    tracked: AtomicBool,
}

impl Subordinate for FlakyTxn {
    fn base_xid(&self) -> Option<Xid> {
        self.base.read().clone()
    }

    fn timeout_secs(&self) -> u32 {
        0
    }

    fn attempt_recovery(&self) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(Error::collaborator("log not reachable"));
        }
        *self.base.write() = Some(self.target.clone());
        Ok(())
    }

    fn record_for_tracking(&self) {
        self.tracked.store(true, Ordering::SeqCst);
    }
}

/// Factory producing unresolved stubs on import, and failing on demand
struct FlakyFactory {
    failures: usize,
    fail_create: AtomicBool,
}

impl FlakyFactory {
    fn new(failures: usize) -> Self {
        Self {
            failures,
            fail_create: AtomicBool::new(false),
        }
    }
}

impl SubordinateFactory for FlakyFactory {
    type Transaction = FlakyTxn;

    fn create(&self, xid: &Xid, _timeout_secs: u32) -> Result<FlakyTxn> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::collaborator("transaction manager unavailable"));
        }
        Ok(FlakyTxn {
            target: xid.clone(),
            base: RwLock::new(None),
            failures: self.failures,
            attempts: AtomicUsize::new(0),
            tracked: AtomicBool::new(false),
        })
    }

    fn reconstruct(&self, activity_id: &ActivityId) -> Result<FlakyTxn> {
        Err(Error::collaborator(format!("cannot read {}", activity_id)))
    }
}

// ============================================================================
// SECTION 1: Lifecycle
// ============================================================================

#[test]
fn test_end_to_end_lifecycle() {
    let importer = Arc::new(create_importer());
    let x = create_xid("X");

    let t1 = importer.import_transaction(&x, 30).unwrap();

    let concurrent = {
        let importer = Arc::clone(&importer);
        let x = x.clone();
        thread::spawn(move || importer.import_transaction(&x, 60).unwrap())
    };
    let also_t1 = concurrent.join().unwrap();
    assert!(Arc::ptr_eq(&t1, &also_t1));
    assert_eq!(also_t1.timeout_secs(), 30);

    let found = importer.lookup(&x).unwrap().unwrap();
    assert!(Arc::ptr_eq(&found, &t1));

    importer.remove_transaction(&x).unwrap();
    assert!(importer.lookup(&x).unwrap().is_none());

    let t2 = importer.import_transaction(&x, 10).unwrap();
    assert!(!Arc::ptr_eq(&t1, &t2));
    assert_eq!(t2.timeout_secs(), 10);
}

#[test]
fn test_drive_imported_transaction_to_completion() {
    let log = Arc::new(InMemoryActivityLog::new());
    let importer = TransactionImporter::new(LoggedSubordinateFactory::new(log.clone()));
    let x = create_xid("2pc");

    let txn = importer.import_transaction(&x, 30).unwrap();
    txn.prepare().unwrap();
    assert_eq!(log.len(), 1);

    // Crash: a new registry over the same log
    let restarted = TransactionImporter::new(LoggedSubordinateFactory::new(log.clone()));
    let recovered = restarted.recover_transaction(&txn.activity_id()).unwrap();
    assert_eq!(recovered.status(), TxStatus::Prepared);

    let found = restarted.lookup(&x).unwrap().unwrap();
    found.commit().unwrap();
    restarted.remove_transaction(&x).unwrap();

    assert!(log.is_empty());
    assert!(restarted.is_empty());
}

// ============================================================================
// SECTION 2: Reconciliation
// ============================================================================

#[test]
fn test_unresolved_stub_retry_then_success() {
    let importer = TransactionImporter::new(FlakyFactory::new(1));
    let x = create_xid("stub");
    let stub = importer.import_transaction(&x, 0).unwrap();
    assert!(stub.base_xid().is_none());

    let first = importer.lookup(&x);
    match first {
        Err(Error::RetryableRecovery { xid }) => assert_eq!(xid, x),
        other => panic!("expected RetryableRecovery, got {:?}", other.map(|t| t.is_some())),
    }

    let second = importer.lookup(&x).unwrap().unwrap();
    assert!(Arc::ptr_eq(&second, &stub));
    assert_eq!(second.base_xid(), Some(x));
    assert_eq!(stub.attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_recovery_stops_once_resolved() {
    let importer = TransactionImporter::new(FlakyFactory::new(0));
    let x = create_xid("resolved");
    importer.import_transaction(&x, 0).unwrap();

    let txn = importer.lookup(&x).unwrap().unwrap();
    assert_eq!(txn.attempts.load(Ordering::SeqCst), 1);

    importer.lookup(&x).unwrap().unwrap();
    assert_eq!(txn.attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_retryable_is_not_not_found() {
    let importer = TransactionImporter::new(FlakyFactory::new(usize::MAX));
    let x = create_xid("never-resolves");
    importer.import_transaction(&x, 0).unwrap();

    for _ in 0..3 {
        let err = importer.lookup(&x).unwrap_err();
        assert!(err.is_retryable());
    }
    assert!(importer.contains(&x));
}

// ============================================================================
// SECTION 3: Failure isolation
// ============================================================================

#[test]
fn test_failed_import_leaves_slot_reusable() {
    let importer = TransactionImporter::new(FlakyFactory::new(0));
    let x = create_xid("retry-import");

    importer.factory().fail_create.store(true, Ordering::SeqCst);
    let err = importer.import_transaction(&x, 5).unwrap_err();
    assert!(matches!(err, Error::CollaboratorFailure(_)));
    assert!(importer.lookup(&x).unwrap().is_none());

    importer.factory().fail_create.store(false, Ordering::SeqCst);
    let txn = importer.import_transaction(&x, 5).unwrap();
    assert!(Arc::ptr_eq(&importer.lookup(&x).unwrap().unwrap(), &txn));
}

#[test]
fn test_reconstruct_error_propagates_unchanged() {
    let importer = TransactionImporter::new(FlakyFactory::new(0));
    let err = importer.recover_transaction(&ActivityId::new()).unwrap_err();
    match err {
        Error::CollaboratorFailure(msg) => assert!(msg.starts_with("cannot read")),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(importer.is_empty());
}

// ============================================================================
// SECTION 4: Model check
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Import(u8, u32),
    Lookup(u8),
    Remove(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4, 0u32..100).prop_map(|(k, t)| Op::Import(k, t)),
        (0u8..4).prop_map(Op::Lookup),
        (0u8..4).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn prop_registry_matches_reference_model(
        ops in proptest::collection::vec(op_strategy(), 1..64)
    ) {
        let importer = create_importer();
        // key -> timeout of the live instance
        let mut model: HashMap<u8, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Import(k, timeout) => {
                    let txn = importer
                        .import_transaction(&create_xid(&k.to_string()), timeout)
                        .unwrap();
                    let expected = *model.entry(k).or_insert(timeout);
                    prop_assert_eq!(txn.timeout_secs(), expected);
                }
                Op::Lookup(k) => {
                    let found = importer.lookup(&create_xid(&k.to_string())).unwrap();
                    prop_assert_eq!(found.map(|t| t.timeout_secs()), model.get(&k).copied());
                }
                Op::Remove(k) => {
                    importer.remove_transaction(&create_xid(&k.to_string())).unwrap();
                    model.remove(&k);
                }
            }
            prop_assert_eq!(importer.len(), model.len());
        }
    }
}
