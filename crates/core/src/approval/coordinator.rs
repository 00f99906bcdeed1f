//! Per-expense serialization of approval updates.
//!
//! The controller is pure, so two approvers deciding the same expense at
//! once could both evaluate a stale state and both advance the step. The
//! coordinator closes that gap: the whole load → apply → save cycle for an
//! expense runs under that expense's lock, while different expenses never
//! contend.

use std::sync::{Arc, Mutex, PoisonError};

use claimflow_shared::{ExpenseId, UserId};
use dashmap::DashMap;
use tracing::warn;

use crate::approval::controller::WorkflowController;
use crate::approval::error::ApprovalError;
use crate::approval::evaluator::StepOutcome;
use crate::approval::state::{DecisionRecord, ExpenseApprovalState};

/// Persistence collaborator for approval states.
pub trait ExpenseStateStore: Send + Sync {
    /// Loads the state of an expense.
    ///
    /// # Errors
    ///
    /// `ExpenseNotFound` for unknown expenses, `Store` for backend failures.
    fn load(&self, expense_id: ExpenseId) -> Result<ExpenseApprovalState, ApprovalError>;

    /// Persists a state, replacing any previous version.
    ///
    /// # Errors
    ///
    /// `Store` for backend failures.
    fn save(&self, state: &ExpenseApprovalState) -> Result<(), ApprovalError>;
}

/// Serializes workflow updates per expense around a state store.
pub struct DecisionCoordinator<S> {
    store: S,
    locks: DashMap<ExpenseId, Arc<Mutex<()>>>,
}

impl<S: ExpenseStateStore> DecisionCoordinator<S> {
    /// Creates a coordinator over `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of expenses with an update in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }

    /// Record a decision with the load → apply → save cycle held under the
    /// expense's lock.
    ///
    /// The state is saved only when the controller accepts the decision.
    ///
    /// # Errors
    ///
    /// Store errors, plus every error of `WorkflowController::record_decision`.
    pub fn submit_decision(
        &self,
        expense_id: ExpenseId,
        step_index: usize,
        decision: DecisionRecord,
    ) -> Result<StepOutcome, ApprovalError> {
        let approver_id = decision.approver_id;
        self.serialized(expense_id, || {
            let state = self.store.load(expense_id)?;
            let (next, outcome) = WorkflowController::record_decision(&state, step_index, decision)
                .inspect_err(|err| log_refused(expense_id, step_index, approver_id, err))?;
            self.store.save(&next)?;
            Ok(outcome)
        })
    }

    /// Apply any controller transition (submit, open, mark paid) under the
    /// expense's lock.
    ///
    /// # Errors
    ///
    /// Store errors, plus whatever `transition` returns. A transition that
    /// returns another expense's state fails with `Store` and nothing is saved.
    pub fn apply<F>(
        &self,
        expense_id: ExpenseId,
        transition: F,
    ) -> Result<ExpenseApprovalState, ApprovalError>
    where
        F: FnOnce(&ExpenseApprovalState) -> Result<ExpenseApprovalState, ApprovalError>,
    {
        self.serialized(expense_id, || {
            let state = self.store.load(expense_id)?;
            let next = transition(&state)?;
            if next.expense_id() != expense_id {
                warn!(
                    expense_id = %expense_id,
                    returned_expense_id = %next.expense_id(),
                    "Transition returned another expense's state"
                );
                return Err(ApprovalError::Store(format!(
                    "transition for expense {expense_id} returned state of expense {}",
                    next.expense_id()
                )));
            }
            self.store.save(&next)?;
            Ok(next)
        })
    }

    fn serialized<T>(&self, expense_id: ExpenseId, f: impl FnOnce() -> T) -> T {
        let handle = Arc::clone(self.locks.entry(expense_id).or_default().value());

        let result = {
            // The mutex guards no data, so a poisoned lock is still usable.
            let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        drop(handle);
        // Clones are only taken under the shard lock, so a count of one means
        // no caller is waiting on this handle.
        self.locks
            .remove_if(&expense_id, |_, handle| Arc::strong_count(handle) == 1);

        result
    }
}

fn log_refused(expense_id: ExpenseId, step_index: usize, approver_id: UserId, err: &ApprovalError) {
    warn!(
        expense_id = %expense_id,
        step_index,
        approver_id = %approver_id,
        error_code = err.error_code(),
        error = %err,
        "Decision refused"
    );
}
