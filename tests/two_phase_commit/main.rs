//! End-to-end two-phase-commit scenarios through the public facade
//!
//! Covers the full happy path with exact event ordering, an interrupted
//! run recovered by a second "worker", and an embedding entity kind whose
//! extra fields ride along in the persisted document.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tandem::prelude::*;
use tandem::{Document, ErrorRecord, Phase, WriteMode};

const LIFECYCLE_EVENTS: [&str; 12] = [
    "beginTransaction.pre",
    "beginTransaction.post",
    "commitTransaction.pre",
    "commitTransaction.post",
    "completeTransaction.pre",
    "completeTransaction.post",
    "beginRollback.pre",
    "beginRollback.post",
    "completeRollback.pre",
    "completeRollback.post",
    "abortTransaction.pre",
    "abortTransaction.post",
];

fn coordinator() -> TransactionCoordinator<MemoryStore> {
    TransactionCoordinator::new(Arc::new(MemoryStore::new()))
}

fn observe_events(
    coordinator: &TransactionCoordinator<MemoryStore>,
) -> Arc<Mutex<Vec<&'static str>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for name in LIFECYCLE_EVENTS {
        let log = Arc::clone(&log);
        coordinator.events().subscribe(name, move |_| {
            log.lock().push(name);
            Ok(())
        });
    }
    log
}

#[test]
fn happy_path_fires_events_in_order_and_ends_done() {
    let coordinator = coordinator();
    let log = observe_events(&coordinator);

    let mut record = TransactionRecord::new(TransactionKind::new("Transfer"));
    coordinator.save(&mut record).unwrap();
    coordinator.process(&mut record).unwrap();

    assert_eq!(record.state(), TransactionState::Done);
    assert_eq!(
        *log.lock(),
        vec![
            "beginTransaction.pre",
            "beginTransaction.post",
            "commitTransaction.pre",
            "commitTransaction.post",
            "completeTransaction.pre",
            "completeTransaction.post",
        ]
    );
}

#[test]
fn listeners_see_pre_state_before_the_write_and_post_state_after() {
    let coordinator = coordinator();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for name in ["beginTransaction.pre", "beginTransaction.post"] {
        let seen = Arc::clone(&seen);
        coordinator.events().subscribe(name, move |event| {
            seen.lock().push((event.phase(), event.record().state()));
            Ok(())
        });
    }

    let mut record = TransactionRecord::new(TransactionKind::new("Transfer"));
    coordinator.save(&mut record).unwrap();
    coordinator.process(&mut record).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            (Phase::Pre, TransactionState::Initial),
            (Phase::Post, TransactionState::Pending),
        ]
    );
}

#[test]
fn interrupted_run_is_unwound_by_a_later_recovery() {
    let coordinator = coordinator();

    // The cohort fails exactly once, as if the worker died mid-commit.
    let fail_once = Arc::new(AtomicBool::new(true));
    {
        let fail_once = Arc::clone(&fail_once);
        coordinator.events().subscribe("commitTransaction.pre", move |_| {
            if fail_once.swap(false, Ordering::SeqCst) {
                Err(Error::listener("cohort crashed"))
            } else {
                Ok(())
            }
        });
    }

    let mut record = TransactionRecord::new(TransactionKind::new("Transfer"));
    coordinator.save(&mut record).unwrap();
    let err = coordinator.process(&mut record).unwrap_err();
    assert_eq!(err.kind(), "Listener");

    // The begin transition landed; the commit never did.
    assert_eq!(record.state(), TransactionState::Pending);
    assert_eq!(record.error().unwrap().exception_kind(), Some("Listener"));
    let document = coordinator
        .store()
        .find_by_id(record.id().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(document["state"], json!("pending"));

    // A later worker unwinds the orphaned record.
    coordinator.recover(&mut record, true).unwrap();
    assert_eq!(record.state(), TransactionState::Cancelled);
    assert!(record.recovery());
}

#[test]
fn rollback_veto_during_recovery_commits_instead() {
    let coordinator = coordinator();
    coordinator
        .events()
        .subscribe("beginRollback.pre", |_| Err(Error::veto("already shipped")));

    // Fabricate the orphaned pending record a crashed worker left behind.
    let mut record = TransactionRecord::new(TransactionKind::new("Transfer"));
    record.set_id(tandem::RecordId::new());
    record.set_state(TransactionState::Pending);
    coordinator
        .store()
        .conditional_write(
            record.id().unwrap(),
            &record.to_document().unwrap(),
            coordinator.write_concern(),
            WriteMode::Upsert,
        )
        .unwrap();

    coordinator.recover(&mut record, true).unwrap();
    assert_eq!(record.state(), TransactionState::Done);
}

#[test]
fn aborted_record_can_be_deleted() {
    let coordinator = coordinator();
    let mut record = TransactionRecord::new(TransactionKind::new("Transfer"));
    coordinator.save(&mut record).unwrap();
    let id = *record.id().unwrap();

    // Recovery of a never-started record aborts it.
    coordinator.recover(&mut record, true).unwrap();
    assert_eq!(record.state(), TransactionState::Aborted);

    coordinator.delete(&RecordCriteria::new(id)).unwrap();
    assert!(coordinator.store().find_by_id(&id).unwrap().is_none());
}

#[test]
fn done_record_cannot_be_deleted() {
    let coordinator = coordinator();
    let mut record = TransactionRecord::new(TransactionKind::new("Transfer"));
    coordinator.save(&mut record).unwrap();
    coordinator.process(&mut record).unwrap();

    let err = coordinator
        .delete(&RecordCriteria::new(*record.id().unwrap()))
        .unwrap_err();
    assert!(err.is_domain());
}

/// An entity kind embedding the transaction record, with its own payload.
struct LedgerTransfer {
    record: TransactionRecord,
    amount: i64,
    debit_account: String,
    credit_account: String,
}

impl LedgerTransfer {
    fn new(amount: i64, debit: &str, credit: &str) -> Self {
        Self {
            record: TransactionRecord::new(TransactionKind::new("LedgerTransfer")),
            amount,
            debit_account: debit.to_string(),
            credit_account: credit.to_string(),
        }
    }
}

impl Transactional for LedgerTransfer {
    fn record(&self) -> &TransactionRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TransactionRecord {
        &mut self.record
    }

    fn to_document(&self) -> Result<Document> {
        let mut document = self.record.to_document()?;
        document.insert("amount".to_string(), json!(self.amount));
        document.insert("debit_account".to_string(), json!(self.debit_account));
        document.insert("credit_account".to_string(), json!(self.credit_account));
        Ok(document)
    }

    fn load_document(&mut self, document: &Document) -> Result<()> {
        self.record.load_document(document)?;
        self.amount = document
            .get("amount")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| Error::InvalidArgument("missing or malformed \"amount\"".to_string()))?;
        self.debit_account = document
            .get("debit_account")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::InvalidArgument("missing or malformed \"debit_account\"".to_string())
            })?
            .to_string();
        self.credit_account = document
            .get("credit_account")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::InvalidArgument("missing or malformed \"credit_account\"".to_string())
            })?
            .to_string();
        Ok(())
    }
}

#[test]
fn embedding_kind_round_trips_its_payload() {
    let coordinator = coordinator();
    let mut transfer = LedgerTransfer::new(250, "acc-1", "acc-2");

    coordinator.save(&mut transfer).unwrap();
    coordinator.process(&mut transfer).unwrap();
    assert_eq!(transfer.record().state(), TransactionState::Done);

    let document = coordinator
        .store()
        .find_by_id(transfer.record().id().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(document["type"], json!("LedgerTransfer"));
    assert_eq!(document["state"], json!("done"));
    assert_eq!(document["amount"], json!(250));
    assert_eq!(document["debit_account"], json!("acc-1"));
    assert_eq!(document["credit_account"], json!("acc-2"));
}

#[test]
fn embedding_kind_survives_recovery_overwrite() {
    let coordinator = coordinator();

    // A crashed worker persisted the pending document with its payload.
    let mut persisted = LedgerTransfer::new(980, "acc-7", "acc-8");
    persisted.record_mut().set_id(tandem::RecordId::new());
    persisted.record_mut().set_state(TransactionState::Pending);
    coordinator
        .store()
        .conditional_write(
            persisted.record().id().unwrap(),
            &Transactional::to_document(&persisted).unwrap(),
            coordinator.write_concern(),
            WriteMode::Upsert,
        )
        .unwrap();

    // The recovering worker starts from a stale in-memory copy.
    let mut stale = LedgerTransfer::new(0, "", "");
    stale.record_mut().set_id(*persisted.record().id().unwrap());

    coordinator.recover(&mut stale, true).unwrap();

    assert_eq!(stale.record().state(), TransactionState::Cancelled);
    assert_eq!(stale.amount, 980);
    assert_eq!(stale.debit_account, "acc-7");
    assert_eq!(stale.credit_account, "acc-8");
}

#[test]
fn captured_error_is_persisted_with_later_transitions() {
    let coordinator = coordinator();

    let fail_once = Arc::new(AtomicBool::new(true));
    {
        let fail_once = Arc::clone(&fail_once);
        coordinator.events().subscribe("commitTransaction.pre", move |_| {
            if fail_once.swap(false, Ordering::SeqCst) {
                Err(Error::listener_with_details(
                    "debit failed",
                    Some(tandem::ErrorCode::Text("E_FUNDS".to_string())),
                    {
                        let mut details = Document::new();
                        details.insert("account".to_string(), json!("acc-1"));
                        details
                    },
                ))
            } else {
                Ok(())
            }
        });
    }

    let mut record = TransactionRecord::new(TransactionKind::new("Transfer"));
    coordinator.save(&mut record).unwrap();
    coordinator.process(&mut record).unwrap_err();

    let captured: &ErrorRecord = record.error().unwrap();
    assert_eq!(captured.exception_kind(), Some("Listener"));
    assert_eq!(captured.message(), Some("listener failure: debit failed"));
    assert_eq!(captured.additional_details()["account"], json!("acc-1"));

    // Recovery re-runs the commit; the error snapshot rides along into
    // the persisted document.
    coordinator.recover(&mut record, false).unwrap();
    let document = coordinator
        .store()
        .find_by_id(record.id().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(document["state"], json!("done"));
    assert_eq!(document["error"]["exception_kind"], json!("Listener"));
}
