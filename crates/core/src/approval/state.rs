//! Per-expense approval state.
//!
//! The state is an explicit value: the surrounding service loads it,
//! hands it to the workflow controller, and persists whatever comes back.
//! Only the controller produces new states.

use chrono::{DateTime, Utc};
use claimflow_shared::{ExpenseId, UserId};
use serde::{Deserialize, Serialize};

use crate::approval::rule::ApprovalRule;
use crate::approval::types::{Decision, ExpenseStatus, StepStatus};

/// A decision cast by one approver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// The approver who decided.
    pub approver_id: UserId,
    /// Approve or reject.
    pub decision: Decision,
    /// When the decision was cast.
    pub decided_at: DateTime<Utc>,
    /// Optional comment from the approver.
    #[serde(default)]
    pub comment: Option<String>,
}

impl DecisionRecord {
    /// Creates a decision cast now.
    #[must_use]
    pub fn new(approver_id: UserId, decision: Decision) -> Self {
        Self {
            approver_id,
            decision,
            decided_at: Utc::now(),
            comment: None,
        }
    }

    /// Creates an approval cast now.
    #[must_use]
    pub fn approve(approver_id: UserId) -> Self {
        Self::new(approver_id, Decision::Approved)
    }

    /// Creates a rejection cast now.
    #[must_use]
    pub fn reject(approver_id: UserId) -> Self {
        Self::new(approver_id, Decision::Rejected)
    }

    /// Attaches a comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// One stage of an expense's approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub(crate) roster: Vec<UserId>,
    pub(crate) decisions: Vec<DecisionRecord>,
    pub(crate) status: StepStatus,
    pub(crate) resolved_at: Option<DateTime<Utc>>,
}

impl ApprovalStep {
    pub(crate) fn new(roster: Vec<UserId>) -> Self {
        Self {
            roster,
            decisions: Vec::new(),
            status: StepStatus::Pending,
            resolved_at: None,
        }
    }

    /// Approvers eligible to act in this step.
    #[must_use]
    pub fn roster(&self) -> &[UserId] {
        &self.roster
    }

    /// Decisions cast so far, in arrival order.
    #[must_use]
    pub fn decisions(&self) -> &[DecisionRecord] {
        &self.decisions
    }

    /// Resolution state of the step.
    #[must_use]
    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Returns true once the step resolved Approved or Rejected.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status.is_resolved()
    }

    /// When the step resolved.
    #[must_use]
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns true if the approver already decided this step.
    #[must_use]
    pub fn has_decided(&self, approver_id: UserId) -> bool {
        self.decisions.iter().any(|d| d.approver_id == approver_id)
    }

    pub(crate) fn resolve(&mut self, status: StepStatus) {
        self.status = status;
        self.resolved_at = Some(Utc::now());
    }
}

/// Approval progress of a single expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseApprovalState {
    pub(crate) expense_id: ExpenseId,
    pub(crate) rule: ApprovalRule,
    pub(crate) status: ExpenseStatus,
    pub(crate) current_step_index: usize,
    pub(crate) steps: Vec<ApprovalStep>,
}

impl ExpenseApprovalState {
    /// Creates a draft expense governed by a snapshot of `rule`.
    #[must_use]
    pub fn new(expense_id: ExpenseId, rule: ApprovalRule) -> Self {
        Self {
            expense_id,
            rule,
            status: ExpenseStatus::Draft,
            current_step_index: 0,
            steps: Vec::new(),
        }
    }

    /// The expense this state belongs to.
    #[must_use]
    pub fn expense_id(&self) -> ExpenseId {
        self.expense_id
    }

    /// The rule snapshot governing every step.
    #[must_use]
    pub fn rule(&self) -> &ApprovalRule {
        &self.rule
    }

    /// Current expense status.
    #[must_use]
    pub fn status(&self) -> ExpenseStatus {
        self.status
    }

    /// Index of the active (or last resolved) step.
    #[must_use]
    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    /// All planned steps.
    #[must_use]
    pub fn steps(&self) -> &[ApprovalStep] {
        &self.steps
    }

    /// The step currently collecting decisions, if any.
    #[must_use]
    pub fn current_step(&self) -> Option<&ApprovalStep> {
        if self.status == ExpenseStatus::Pending {
            self.steps.get(self.current_step_index)
        } else {
            None
        }
    }

    /// Returns true if no further decision may be recorded.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
