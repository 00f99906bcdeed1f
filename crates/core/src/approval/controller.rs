//! Workflow controller for expense approval state transitions.
//!
//! This module implements the state machine that opens approval steps,
//! applies decisions through the rule evaluator, and moves an expense
//! to its terminal status.

use claimflow_shared::UserId;
use tracing::{debug, info};

use crate::approval::error::ApprovalError;
use crate::approval::evaluator::{RuleEvaluator, StepOutcome};
use crate::approval::state::{ApprovalStep, DecisionRecord, ExpenseApprovalState};
use crate::approval::types::{ExpenseStatus, StepStatus};

/// Stateless controller for expense approval transitions.
///
/// Every method takes the current state by reference and returns a new
/// state, so a failed call leaves the caller's state untouched.
pub struct WorkflowController;

impl WorkflowController {
    /// Submit a draft expense.
    ///
    /// # Errors
    /// * `InvalidTransition` if the expense is not in Draft status
    pub fn submit(state: &ExpenseApprovalState) -> Result<ExpenseApprovalState, ApprovalError> {
        Self::ensure_transition(state.status, ExpenseStatus::Submitted)?;

        let mut next = state.clone();
        next.status = ExpenseStatus::Submitted;
        info!(expense_id = %next.expense_id, "Expense submitted");
        Ok(next)
    }

    /// Open the approval steps of a submitted expense.
    ///
    /// # Arguments
    /// * `state` - A Submitted expense
    /// * `rosters` - One roster per step, in order (see `StepPlanner`)
    ///
    /// # Errors
    /// * `InvalidTransition` if the expense is not in Submitted status
    /// * `InvalidRule` if the rule snapshot is malformed
    /// * `EmptyRoster` if no step is given or any roster is empty
    pub fn open(
        state: &ExpenseApprovalState,
        rosters: Vec<Vec<UserId>>,
    ) -> Result<ExpenseApprovalState, ApprovalError> {
        Self::ensure_transition(state.status, ExpenseStatus::Pending)?;
        state.rule.validate()?;

        if rosters.is_empty() {
            return Err(ApprovalError::EmptyRoster { step_index: 0 });
        }
        if let Some(step_index) = rosters.iter().position(Vec::is_empty) {
            return Err(ApprovalError::EmptyRoster { step_index });
        }

        let mut next = state.clone();
        next.steps = rosters.into_iter().map(ApprovalStep::new).collect();
        next.current_step_index = 0;
        next.status = ExpenseStatus::Pending;

        info!(
            expense_id = %next.expense_id,
            rule_id = %next.rule.id,
            steps = next.steps.len(),
            "Approval opened"
        );
        Ok(next)
    }

    /// Record a decision against the active step.
    ///
    /// The decision is appended to the step's log and the rule evaluator
    /// decides the step:
    /// - Rejected terminates the expense as Rejected
    /// - Approved opens the next step, or approves the expense after the last one
    /// - Pending leaves everything else unchanged
    ///
    /// # Errors
    /// * `InvalidStep` if the expense is not Pending or `step_index` is not active
    /// * `DuplicateDecision` if the approver already decided this step
    pub fn record_decision(
        state: &ExpenseApprovalState,
        step_index: usize,
        decision: DecisionRecord,
    ) -> Result<(ExpenseApprovalState, StepOutcome), ApprovalError> {
        let invalid_step = || ApprovalError::InvalidStep {
            step_index,
            current_step_index: state.current_step_index,
            status: state.status,
        };

        if state.status != ExpenseStatus::Pending || step_index != state.current_step_index {
            return Err(invalid_step());
        }
        let step = state.steps.get(step_index).ok_or_else(invalid_step)?;
        if step.is_resolved() {
            return Err(invalid_step());
        }
        if step.has_decided(decision.approver_id) {
            return Err(ApprovalError::DuplicateDecision {
                approver_id: decision.approver_id,
                step_index,
            });
        }

        let mut next = state.clone();
        let approver_id = decision.approver_id;
        let cast = decision.decision;

        let step = &mut next.steps[step_index];
        step.decisions.push(decision);
        let outcome = RuleEvaluator::evaluate_step(&next.rule, &step.roster, &step.decisions);

        debug!(
            expense_id = %next.expense_id,
            step_index,
            approver_id = %approver_id,
            decision = %cast,
            status = %outcome.status,
            "Decision recorded"
        );

        match outcome.status {
            StepStatus::Pending => {}
            StepStatus::Rejected => {
                step.resolve(StepStatus::Rejected);
                next.status = ExpenseStatus::Rejected;
                info!(
                    expense_id = %next.expense_id,
                    step_index,
                    reason = %outcome.reason,
                    condition = ?outcome.condition,
                    "Expense rejected"
                );
            }
            StepStatus::Approved => {
                step.resolve(StepStatus::Approved);
                if step_index + 1 < next.steps.len() {
                    next.current_step_index = step_index + 1;
                    info!(
                        expense_id = %next.expense_id,
                        step_index,
                        next_step_index = next.current_step_index,
                        reason = %outcome.reason,
                        condition = ?outcome.condition,
                        "Step approved, advancing"
                    );
                } else {
                    next.status = ExpenseStatus::Approved;
                    info!(
                        expense_id = %next.expense_id,
                        step_index,
                        reason = %outcome.reason,
                        condition = ?outcome.condition,
                        "Expense approved"
                    );
                }
            }
        }

        Ok((next, outcome))
    }

    /// Mark an approved expense as paid.
    ///
    /// # Errors
    /// * `InvalidTransition` if the expense is not in Approved status
    pub fn mark_paid(state: &ExpenseApprovalState) -> Result<ExpenseApprovalState, ApprovalError> {
        Self::ensure_transition(state.status, ExpenseStatus::Paid)?;

        let mut next = state.clone();
        next.status = ExpenseStatus::Paid;
        info!(expense_id = %next.expense_id, "Expense paid");
        Ok(next)
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → Submitted
    /// - Submitted → Pending
    /// - Pending → Pending | Approved | Rejected
    /// - Approved → Paid
    #[must_use]
    pub fn is_valid_transition(from: ExpenseStatus, to: ExpenseStatus) -> bool {
        matches!(
            (from, to),
            (ExpenseStatus::Draft, ExpenseStatus::Submitted)
                | (ExpenseStatus::Submitted, ExpenseStatus::Pending)
                | (
                    ExpenseStatus::Pending,
                    ExpenseStatus::Pending | ExpenseStatus::Approved | ExpenseStatus::Rejected
                )
                | (ExpenseStatus::Approved, ExpenseStatus::Paid)
        )
    }

    fn ensure_transition(from: ExpenseStatus, to: ExpenseStatus) -> Result<(), ApprovalError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(ApprovalError::InvalidTransition { from, to })
        }
    }
}
