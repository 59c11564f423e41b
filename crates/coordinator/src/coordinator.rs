//! The transaction coordinator
//!
//! Emulates two-phase-commit semantics for a single transaction record on
//! top of a store that only offers single-document atomicity.
//!
//! ## Transition sequence
//!
//! Every state change goes through one primitive:
//!
//! ```text
//! 1. Refuse if the record has no identity (Domain)
//! 2. Refuse if the record is not in the operation's from-state (Domain)
//! 3. Publish <operation>.pre - a listener error vetoes the transition,
//!    nothing has been mutated or persisted yet
//! 4. Mutate the state in memory
//! 5. Conditional write scoped by identity under the durable write
//!    concern - exactly one document must be affected (DURABILITY POINT)
//! 6. Publish <operation>.post
//! ```
//!
//! If a crash or error interrupts the sequence, the persisted document
//! reflects whichever steps completed; [`TransactionCoordinator::recover`]
//! re-derives the true state from the store and resumes or unwinds.
//!
//! ## Isolation
//!
//! Transition writes are conditioned on identity alone, not on the
//! expected prior state. Cross-process mutual exclusion is delegated to
//! the store's identity-scoped writes plus the operational rule that one
//! worker owns a record at a time; the coordinator holds no lock across
//! calls.

use std::sync::Arc;
use tandem_core::{
    Error, ErrorRecord, RecordCriteria, RecordId, Result, TransactionOperation, TransactionRecord,
    TransactionState, Transactional,
};
use tandem_events::{EventBus, Phase, TransitionEvent};
use tandem_store::{PersistenceStore, WriteConcern, WriteMode};

/// Remap a rollback veto surfacing outside its one legal window.
///
/// The veto signal is honored only when `recover` intercepts it from the
/// `beginRollback.pre` phase; everywhere else it is a fatal contract
/// violation.
fn deny_veto(result: Result<()>) -> Result<()> {
    match result {
        Err(Error::RollbackVeto { reason }) => Err(Error::Domain(format!(
            "a rollback veto is only permitted during the \"beginRollback.pre\" phase: {}",
            reason
        ))),
        other => other,
    }
}

/// The state machine engine coordinating two-phase transactions.
///
/// Construct one per store with [`TransactionCoordinator::new`] or
/// [`TransactionCoordinator::builder`]; cohorts subscribe to lifecycle
/// events through [`TransactionCoordinator::events`]. The coordinator is
/// synchronous and holds no internal locks; any number of worker
/// processes may race to recover the same orphaned record.
pub struct TransactionCoordinator<S: PersistenceStore> {
    store: Arc<S>,
    events: EventBus,
    write_concern: WriteConcern,
}

impl<S: PersistenceStore> TransactionCoordinator<S> {
    /// A coordinator over the given store with a fresh event bus and the
    /// default majority-journaled write concern.
    pub fn new(store: Arc<S>) -> Self {
        Self::builder(store).build()
    }

    /// Builder for explicit event-bus and write-concern configuration.
    pub fn builder(store: Arc<S>) -> CoordinatorBuilder<S> {
        CoordinatorBuilder::new(store)
    }

    /// The event bus cohorts subscribe to.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The persistence store this coordinator writes through.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The write concern applied to every write and remove.
    pub fn write_concern(&self) -> &WriteConcern {
        &self.write_concern
    }

    /// Replace the write concern.
    ///
    /// The concern was validated at construction, so durability is
    /// guaranteed by type.
    pub fn set_write_concern(&mut self, concern: WriteConcern) {
        self.write_concern = concern;
    }

    /// Coordinate the whole two-phase sequence for a fresh transaction.
    ///
    /// The record must be in `Initial` state and already saved. The
    /// sequence is begin, commit, complete:
    ///
    /// - cohorts performing external side effects listen on
    ///   `commitTransaction.pre`; those operations MUST be idempotent,
    ///   because recovery may perform the commit again after a crash
    /// - `completeTransaction.pre` is for releasing locks and idempotent
    ///   cleanup; it too is re-applied by recovery
    /// - `completeTransaction.post` has no durability guarantee at all:
    ///   if the process dies right after `Done` is persisted, post
    ///   listeners never run
    pub fn process<T: Transactional + ?Sized>(&self, transaction: &mut T) -> Result<()> {
        let state = transaction.record().state();
        if state != TransactionState::Initial {
            return Err(Error::Runtime(format!(
                "transaction must be in \"{}\" state in order to be processed: \"{}\" state given",
                TransactionState::Initial,
                state
            )));
        }

        deny_veto(self.begin_transaction(transaction))?;
        deny_veto(self.commit_transaction(transaction))?;
        deny_veto(self.complete_transaction(transaction))
    }

    /// Resume or unwind a transaction after an interruption.
    ///
    /// The in-memory copy may be stale relative to what was actually
    /// persisted, so the record is first re-fetched by identity; if the
    /// fetched state differs, the fetched copy wins and every in-memory
    /// field is overwritten. The recovery flag is then set irreversibly
    /// and the record is driven onward from its authoritative state:
    ///
    /// - `Initial`: abort (it never properly started)
    /// - `Pending`: roll back when `try_rollback` is set, unless a cohort
    ///   vetoes during `beginRollback.pre` - then, and when
    ///   `try_rollback` is unset, commit and complete instead. A veto
    ///   arriving once the rollback has begun is a fatal Domain error.
    /// - `Applied`: complete (the commit is already durable)
    /// - `Canceling`: finish the rollback
    /// - terminal states: nothing to do, no I/O, no events
    ///
    /// Recovery is idempotent and safe to call repeatedly, including from
    /// a different process than the one that failed.
    pub fn recover<T: Transactional + ?Sized>(
        &self,
        transaction: &mut T,
        try_rollback: bool,
    ) -> Result<()> {
        let id = match transaction.record().id() {
            Some(id) => *id,
            None => {
                return Err(Error::Runtime(
                    "transaction cannot be recovered because it has never been persisted"
                        .to_string(),
                ))
            }
        };

        // The store is the source of truth. A missing document means the
        // record is unrecoverable from this process: another process may
        // be holding it behind an isolation block, or it never existed.
        let document = self.store.find_by_id(&id)?.ok_or_else(|| {
            Error::Runtime(format!(
                "transaction \"{}\" does not exist or is inconsistent",
                id
            ))
        })?;

        let persisted = TransactionRecord::from_document(&document)?;
        if persisted.state() != transaction.record().state() {
            // The last attempted write failed partway; discard the
            // in-memory mutations and take the persisted copy.
            transaction.load_document(&document)?;
        }

        transaction.record_mut().set_recovery(true)?;
        tracing::debug!(
            %id,
            state = %transaction.record().state(),
            try_rollback,
            "recovering transaction"
        );

        match transaction.record().state() {
            // Never properly started; safe to abandon.
            TransactionState::Initial => deny_veto(self.abort_transaction(transaction)),

            TransactionState::Pending => {
                if try_rollback {
                    match self.begin_rollback(transaction) {
                        Ok(()) => return deny_veto(self.complete_rollback(transaction)),
                        Err(Error::RollbackVeto { reason })
                            if transaction.record().state() == TransactionState::Pending =>
                        {
                            // Vetoed during the pre phase: nothing was
                            // persisted, the rollback is refused and the
                            // commit is performed instead.
                            tracing::debug!(%id, %reason, "rollback refused by cohort, committing");
                        }
                        Err(err) => return deny_veto(Err(err)),
                    }
                }

                deny_veto(self.commit_transaction(transaction))?;
                deny_veto(self.complete_transaction(transaction))
            }

            // Commit already durable; only the terminal marking remains.
            TransactionState::Applied => deny_veto(self.complete_transaction(transaction)),

            // Rollback already begun; finish it.
            TransactionState::Canceling => deny_veto(self.complete_rollback(transaction)),

            state => {
                debug_assert!(state.is_terminal());
                tracing::debug!(%id, %state, "transaction already terminal, nothing to recover");
                Ok(())
            }
        }
    }

    /// Create or update the transaction header.
    ///
    /// Permitted only while the record is in `Initial` state. A record
    /// without an identity gets a fresh one, kept only if the insert
    /// reports exactly one affected document. Write-path failures attach
    /// an [`ErrorRecord`] to the record and re-raise.
    pub fn save<T: Transactional + ?Sized>(&self, transaction: &mut T) -> Result<()> {
        let state = transaction.record().state();
        if state != TransactionState::Initial {
            return Err(Error::Domain(format!(
                "only transactions in \"{}\" state can be created or updated: \"{}\" state given",
                TransactionState::Initial,
                state
            )));
        }

        let result = self.isolated_save(transaction);
        if let Err(err) = &result {
            transaction.record_mut().set_error(ErrorRecord::capture(err));
        }
        result
    }

    fn isolated_save<T: Transactional + ?Sized>(&self, transaction: &mut T) -> Result<()> {
        let existing = transaction.record().id().copied();
        let id = existing.unwrap_or_else(RecordId::new);
        if existing.is_none() {
            transaction.record_mut().set_id(id);
        }

        let outcome = transaction.to_document().and_then(|document| {
            self.store
                .conditional_write(&id, &document, &self.write_concern, WriteMode::Upsert)
        });

        match outcome {
            Ok(1) => {
                tracing::debug!(%id, "transaction header saved");
                Ok(())
            }
            Ok(n) => {
                if existing.is_none() {
                    transaction.record_mut().clear_id();
                }
                Err(Error::Runtime(format!(
                    "unexpected write result: expected just one affected document, got \"{}\"",
                    n
                )))
            }
            Err(err) => {
                if existing.is_none() {
                    transaction.record_mut().clear_id();
                }
                Err(err)
            }
        }
    }

    /// Remove a transaction that never produced cohort-visible effects.
    ///
    /// The target is fetched first; a missing target is a fatal Runtime
    /// error, and only persisted `Initial` or `Aborted` records may be
    /// removed - a transaction that has begun cohort-visible side effects
    /// must never be silently deleted.
    pub fn delete(&self, criteria: &RecordCriteria) -> Result<()> {
        let id = *criteria.id();

        let document = self.store.find_by_id(&id)?.ok_or_else(|| {
            Error::Runtime(format!(
                "transaction \"{}\" cannot be deleted because it does not exist or is inconsistent",
                id
            ))
        })?;

        let persisted = TransactionRecord::from_document(&document)?;
        match persisted.state() {
            TransactionState::Initial | TransactionState::Aborted => {}
            state => {
                return Err(Error::Domain(format!(
                    "only transactions with \"{}\" or \"{}\" states can be deleted: transaction \"{}\" has \"{}\" state",
                    TransactionState::Initial,
                    TransactionState::Aborted,
                    id,
                    state
                )))
            }
        }

        let affected = self.store.conditional_remove(&id, &self.write_concern)?;
        if affected != 1 {
            return Err(Error::Runtime(format!(
                "unexpected remove result: expected just one affected document, got \"{}\"",
                affected
            )));
        }
        tracing::debug!(%id, "transaction deleted");
        Ok(())
    }

    fn begin_transaction<T: Transactional + ?Sized>(&self, transaction: &mut T) -> Result<()> {
        self.switch_state(transaction, TransactionOperation::BeginTransaction)
    }

    fn commit_transaction<T: Transactional + ?Sized>(&self, transaction: &mut T) -> Result<()> {
        self.switch_state(transaction, TransactionOperation::CommitTransaction)
    }

    fn complete_transaction<T: Transactional + ?Sized>(&self, transaction: &mut T) -> Result<()> {
        self.switch_state(transaction, TransactionOperation::CompleteTransaction)
    }

    fn begin_rollback<T: Transactional + ?Sized>(&self, transaction: &mut T) -> Result<()> {
        self.switch_state(transaction, TransactionOperation::BeginRollback)
    }

    fn complete_rollback<T: Transactional + ?Sized>(&self, transaction: &mut T) -> Result<()> {
        self.switch_state(transaction, TransactionOperation::CompleteRollback)
    }

    fn abort_transaction<T: Transactional + ?Sized>(&self, transaction: &mut T) -> Result<()> {
        self.switch_state(transaction, TransactionOperation::AbortTransaction)
    }

    /// The single transition primitive.
    ///
    /// Any failure anywhere in the sequence - guard checks, listener
    /// errors, the durable write - is captured into the record's error
    /// field and re-raised. The persisted state reflects whichever steps
    /// completed before the failure.
    fn switch_state<T: Transactional + ?Sized>(
        &self,
        transaction: &mut T,
        op: TransactionOperation,
    ) -> Result<()> {
        let result = self.try_switch(transaction, op);
        if let Err(err) = &result {
            transaction.record_mut().set_error(ErrorRecord::capture(err));
        }
        result
    }

    fn try_switch<T: Transactional + ?Sized>(
        &self,
        transaction: &mut T,
        op: TransactionOperation,
    ) -> Result<()> {
        let from = op.from_state();
        let to = op.to_state();

        let id = match transaction.record().id() {
            Some(id) => *id,
            None => {
                return Err(Error::Domain(format!(
                    "{}: cannot change state from \"{}\" to \"{}\" because the transaction has no identity",
                    op, from, to
                )))
            }
        };

        let current = transaction.record().state();
        if current != from {
            return Err(Error::Domain(format!(
                "{}({}): cannot change state from \"{}\" to \"{}\" because the transaction's current state is \"{}\"",
                op, id, from, to, current
            )));
        }

        let criteria = RecordCriteria::new(id);

        self.events.publish(
            op.pre_event(),
            &TransitionEvent::new(op, Phase::Pre, transaction.record(), criteria.clone()),
        )?;

        transaction.record_mut().set_state(to);

        let document = transaction.to_document()?;
        let affected =
            self.store
                .conditional_write(&id, &document, &self.write_concern, WriteMode::MustExist)?;
        if affected != 1 {
            return Err(Error::Runtime(format!(
                "unexpected write result: expected just one affected document, got \"{}\"",
                affected
            )));
        }
        tracing::debug!(%id, operation = op.name(), from = %from, to = %to, "transition persisted");

        self.events.publish(
            op.post_event(),
            &TransitionEvent::new(op, Phase::Post, transaction.record(), criteria),
        )?;
        Ok(())
    }
}

/// Builder for [`TransactionCoordinator`].
///
/// All dependencies are constructed and passed in explicitly; there are
/// no global defaults or lazily initialized singletons.
pub struct CoordinatorBuilder<S: PersistenceStore> {
    store: Arc<S>,
    events: EventBus,
    write_concern: WriteConcern,
}

impl<S: PersistenceStore> CoordinatorBuilder<S> {
    /// A builder over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            events: EventBus::new(),
            write_concern: WriteConcern::majority_journaled(),
        }
    }

    /// Use an existing event bus (e.g. one shared with other components).
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Use a specific write concern.
    pub fn write_concern(mut self, concern: WriteConcern) -> Self {
        self.write_concern = concern;
        self
    }

    /// Build the coordinator.
    pub fn build(self) -> TransactionCoordinator<S> {
        TransactionCoordinator {
            store: self.store,
            events: self.events,
            write_concern: self.write_concern,
        }
    }
}
