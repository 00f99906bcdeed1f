//! Approval rule configuration.
//!
//! A rule describes who sits on the approval panel and which conditions
//! resolve a step. Rules are stored per company and snapshotted into each
//! expense's approval state when the expense enters the workflow.

use std::collections::HashSet;

use claimflow_shared::{ApprovalRuleId, CompanyId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::approval::error::RuleViolation;

/// A member of the configured approval panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleApprover {
    /// The approver's user ID.
    pub approver_id: UserId,
    /// A rejection by this approver vetoes the step.
    #[serde(default)]
    pub required: bool,
    /// Position in a sequential flow (lower acts first).
    #[serde(default)]
    pub sequence: i32,
}

/// An approval rule governing how expense steps resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier for the rule.
    pub id: ApprovalRuleId,
    /// The company that owns the rule.
    pub company_id: CompanyId,
    /// Human-readable name, e.g. "Travel over 500".
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Inactive rules are kept but never selected.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Route the first step to the submitter's direct manager.
    #[serde(default)]
    pub is_manager_approver: bool,
    /// Approvers act in `sequence` order and each step needs its full roster.
    #[serde(default)]
    pub sequential: bool,
    /// The configured approval panel.
    #[serde(default)]
    pub approvers: Vec<RuleApprover>,
    /// Fraction of the roster whose approval resolves a step (0 disables).
    #[serde(default)]
    pub min_approval_percentage: Decimal,
    /// An approver whose approval alone resolves a step.
    #[serde(default)]
    pub special_approver_id: Option<UserId>,
}

fn default_active() -> bool {
    true
}

impl ApprovalRule {
    /// Creates an active, parallel rule with an empty panel and no threshold.
    #[must_use]
    pub fn new(company_id: CompanyId, name: impl Into<String>) -> Self {
        Self {
            id: ApprovalRuleId::new(),
            company_id,
            name: name.into(),
            description: String::new(),
            active: true,
            is_manager_approver: false,
            sequential: false,
            approvers: Vec::new(),
            min_approval_percentage: Decimal::ZERO,
            special_approver_id: None,
        }
    }

    /// Adds a panel member.
    #[must_use]
    pub fn with_approver(mut self, approver_id: UserId, required: bool, sequence: i32) -> Self {
        self.approvers.push(RuleApprover {
            approver_id,
            required,
            sequence,
        });
        self
    }

    /// Sets the approval threshold.
    #[must_use]
    pub fn with_min_approval_percentage(mut self, percentage: Decimal) -> Self {
        self.min_approval_percentage = percentage;
        self
    }

    /// Sets the special approver.
    #[must_use]
    pub fn with_special_approver(mut self, approver_id: UserId) -> Self {
        self.special_approver_id = Some(approver_id);
        self
    }

    /// Marks the rule sequential.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }

    /// Routes the first step to the submitter's manager.
    #[must_use]
    pub fn manager_first(mut self) -> Self {
        self.is_manager_approver = true;
        self
    }

    /// Returns true if the approver holds a veto on this rule.
    #[must_use]
    pub fn is_required_approver(&self, approver_id: UserId) -> bool {
        self.approvers
            .iter()
            .any(|a| a.required && a.approver_id == approver_id)
    }

    /// Returns the panel member IDs in configured order.
    #[must_use]
    pub fn approver_ids(&self) -> Vec<UserId> {
        self.approvers.iter().map(|a| a.approver_id).collect()
    }

    /// Checks the rule's invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violation found:
    /// * `MissingName` for a blank name
    /// * `PercentageOutOfRange` if the threshold is outside `[0, 1]`
    /// * `DuplicateApprover` if a panel member is listed twice
    pub fn validate(&self) -> Result<(), RuleViolation> {
        if self.name.trim().is_empty() {
            return Err(RuleViolation::MissingName);
        }

        if self.min_approval_percentage < Decimal::ZERO
            || self.min_approval_percentage > Decimal::ONE
        {
            return Err(RuleViolation::PercentageOutOfRange(
                self.min_approval_percentage,
            ));
        }

        let mut seen = HashSet::with_capacity(self.approvers.len());
        for approver in &self.approvers {
            if !seen.insert(approver.approver_id) {
                return Err(RuleViolation::DuplicateApprover(approver.approver_id));
            }
        }

        Ok(())
    }
}
