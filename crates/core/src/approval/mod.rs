//! Expense approval decision engine for Claimflow.
//!
//! This module decides approval steps from a company's rule and drives an
//! expense through its approval lifecycle.
//!
//! # Modules
//!
//! - `types` - Decision and status enums
//! - `error` - Approval-specific error types
//! - `rule` - Approval rule configuration
//! - `rulebook` - Rules keyed by company, loadable from a file
//! - `state` - Per-expense approval state and decision log
//! - `evaluator` - Step resolution by rule precedence
//! - `planner` - Step rosters from a rule
//! - `controller` - Lifecycle state machine
//! - `coordinator` - Per-expense serialization around a state store

pub mod controller;
pub mod coordinator;
pub mod error;
pub mod evaluator;
pub mod planner;
pub mod rule;
pub mod rulebook;
pub mod state;
pub mod types;

#[cfg(test)]
mod controller_props;

pub use controller::WorkflowController;
pub use coordinator::{DecisionCoordinator, ExpenseStateStore};
pub use error::{ApprovalError, RuleViolation};
pub use evaluator::{ResolutionCondition, RuleEvaluator, StepOutcome};
pub use planner::{PlanningOptions, StepPlanner};
pub use rule::{ApprovalRule, RuleApprover};
pub use rulebook::RuleBook;
pub use state::{ApprovalStep, DecisionRecord, ExpenseApprovalState};
pub use types::{Decision, ExpenseStatus, StepStatus};
