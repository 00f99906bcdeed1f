//! Approval error types for expense lifecycle management.
//!
//! This module defines all error types that can occur while validating
//! rules, planning steps, and recording decisions.

use claimflow_shared::{AppError, CompanyId, ExpenseId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::approval::types::ExpenseStatus;

/// Reasons an approval rule is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// Threshold outside the inclusive range `[0, 1]`.
    #[error("minimum approval percentage {0} is outside [0, 1]")]
    PercentageOutOfRange(Decimal),

    /// The same approver is listed twice on the panel.
    #[error("approver {0} is listed more than once")]
    DuplicateApprover(UserId),

    /// The stored rule has a blank name.
    #[error("rule name is required")]
    MissingName,
}

/// Errors that can occur during approval operations.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The rule is malformed and cannot be used until corrected.
    #[error("Invalid approval rule: {0}")]
    InvalidRule(#[from] RuleViolation),

    /// A decision targeted a step that is not open.
    #[error(
        "Step {step_index} is not open for decisions (current step {current_step_index}, status {status})"
    )]
    InvalidStep {
        /// The step the decision was submitted against.
        step_index: usize,
        /// The step that is actually active.
        current_step_index: usize,
        /// The expense status at the time of the call.
        status: ExpenseStatus,
    },

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ExpenseStatus,
        /// The attempted target status.
        to: ExpenseStatus,
    },

    /// The approver has already decided the active step.
    #[error("Approver {approver_id} has already decided step {step_index}")]
    DuplicateDecision {
        /// The approver who resubmitted.
        approver_id: UserId,
        /// The step index.
        step_index: usize,
    },

    /// A step would be opened with nobody able to decide it.
    #[error("Step {step_index} has no eligible approvers")]
    EmptyRoster {
        /// Index of the offending step.
        step_index: usize,
    },

    /// A manager-first rule was planned for a submitter without a manager.
    #[error("Rule requires the submitter's manager but none is on record")]
    ManagerNotFound,

    /// The company has no active approval rule.
    #[error("No active approval rule for company {0}")]
    NoActiveRule(CompanyId),

    /// The state store has no record of the expense.
    #[error("Expense {0} not found")]
    ExpenseNotFound(ExpenseId),

    /// The rules file could not be read or parsed.
    #[error("Rules file error: {0}")]
    RulesFile(String),

    /// The state store failed.
    #[error("Storage error: {0}")]
    Store(String),
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRule(_) | Self::InvalidTransition { .. } => 400,

            Self::NoActiveRule(_) | Self::ExpenseNotFound(_) => 404,

            Self::InvalidStep { .. } | Self::DuplicateDecision { .. } => 409,

            Self::EmptyRoster { .. } | Self::ManagerNotFound => 422,

            Self::RulesFile(_) | Self::Store(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRule(_) => "INVALID_RULE",
            Self::InvalidStep { .. } => "INVALID_STEP",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::DuplicateDecision { .. } => "DUPLICATE_DECISION",
            Self::EmptyRoster { .. } => "EMPTY_ROSTER",
            Self::ManagerNotFound => "MANAGER_NOT_FOUND",
            Self::NoActiveRule(_) => "NO_ACTIVE_RULE",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::RulesFile(_) => "RULES_FILE_ERROR",
            Self::Store(_) => "STORAGE_ERROR",
        }
    }
}

impl From<ApprovalError> for AppError {
    fn from(err: ApprovalError) -> Self {
        let message = err.to_string();
        match err {
            ApprovalError::InvalidRule(_) | ApprovalError::InvalidTransition { .. } => {
                Self::Validation(message)
            }
            ApprovalError::NoActiveRule(_) | ApprovalError::ExpenseNotFound(_) => {
                Self::NotFound(message)
            }
            ApprovalError::InvalidStep { .. } | ApprovalError::DuplicateDecision { .. } => {
                Self::Conflict(message)
            }
            ApprovalError::EmptyRoster { .. } | ApprovalError::ManagerNotFound => {
                Self::BusinessRule(message)
            }
            ApprovalError::RulesFile(_) => Self::Configuration(message),
            ApprovalError::Store(_) => Self::Storage(message),
        }
    }
}
