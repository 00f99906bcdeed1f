//! Rule evaluator for a single approval step.
//!
//! Evaluation walks [`ResolutionCondition::PRECEDENCE`] in order and the
//! first condition that fires decides the step. The evaluator is a pure
//! function of its inputs: it holds no state and never mutates them.

use claimflow_shared::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::approval::rule::ApprovalRule;
use crate::approval::state::DecisionRecord;
use crate::approval::types::{Decision, StepStatus};

/// A condition able to resolve a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionCondition {
    /// The special approver approved.
    SpecialApprover,
    /// A required approver rejected.
    RequiredVeto,
    /// Enough of the roster approved to meet the threshold.
    ApprovalThreshold,
    /// The whole roster approved.
    Unanimity,
}

impl ResolutionCondition {
    /// Evaluation order. The first condition that fires wins.
    pub const PRECEDENCE: [Self; 4] = [
        Self::SpecialApprover,
        Self::RequiredVeto,
        Self::ApprovalThreshold,
        Self::Unanimity,
    ];

    /// Returns the string representation of the condition.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpecialApprover => "special_approver",
            Self::RequiredVeto => "required_veto",
            Self::ApprovalThreshold => "approval_threshold",
            Self::Unanimity => "unanimity",
        }
    }

    fn check(self, rule: &ApprovalRule, tally: &StepTally) -> Option<StepOutcome> {
        match self {
            Self::SpecialApprover => tally
                .special_approved
                .then(|| StepOutcome::approved(self, "special approver approved")),

            Self::RequiredVeto => tally
                .required_rejected
                .then(|| StepOutcome::rejected(self, "required approver rejected")),

            Self::ApprovalThreshold => {
                let threshold = rule.min_approval_percentage;
                if threshold <= Decimal::ZERO {
                    return None;
                }
                let pct = tally.approval_ratio();
                (pct >= threshold).then(|| {
                    StepOutcome::approved(
                        self,
                        format!("threshold {threshold} met ({})", pct.round_dp(4).normalize()),
                    )
                })
            }

            Self::Unanimity => {
                if tally.total == 0 || tally.has_reject || tally.approved != tally.total {
                    return None;
                }
                if rule.sequential {
                    (tally.acted == tally.total).then(|| {
                        StepOutcome::approved(self, "all approvers approved in sequential step")
                    })
                } else {
                    Some(StepOutcome::approved(
                        self,
                        "all approvers approved (parallel)",
                    ))
                }
            }
        }
    }
}

impl fmt::Display for ResolutionCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of evaluating one step.
///
/// A single `status` field makes Approved and Rejected mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Approved, Rejected or Pending.
    pub status: StepStatus,
    /// Human-readable explanation.
    pub reason: String,
    /// The condition that resolved the step (None while pending).
    pub condition: Option<ResolutionCondition>,
}

impl StepOutcome {
    fn approved(condition: ResolutionCondition, reason: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Approved,
            reason: reason.into(),
            condition: Some(condition),
        }
    }

    fn rejected(condition: ResolutionCondition, reason: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Rejected,
            reason: reason.into(),
            condition: Some(condition),
        }
    }

    fn pending() -> Self {
        Self {
            status: StepStatus::Pending,
            reason: "no condition met yet".to_string(),
            condition: None,
        }
    }

    /// Returns true if the step resolved.
    #[must_use]
    pub fn resolved(&self) -> bool {
        self.status.is_resolved()
    }
}

/// Counts derived once per evaluation.
///
/// `total` is the roster size. Approvals and actions count every cast
/// decision, including ones from approvers outside the roster.
#[derive(Debug, Default)]
struct StepTally {
    total: usize,
    approved: usize,
    acted: usize,
    has_reject: bool,
    special_approved: bool,
    required_rejected: bool,
}

impl StepTally {
    fn collect(rule: &ApprovalRule, roster: &[UserId], decisions: &[DecisionRecord]) -> Self {
        let mut tally = Self {
            total: roster.len(),
            acted: decisions.len(),
            ..Self::default()
        };

        for record in decisions {
            match record.decision {
                Decision::Approved => {
                    tally.approved += 1;
                    if rule.special_approver_id == Some(record.approver_id) {
                        tally.special_approved = true;
                    }
                }
                Decision::Rejected => {
                    tally.has_reject = true;
                    if rule.is_required_approver(record.approver_id) {
                        tally.required_rejected = true;
                    }
                }
            }
        }

        tally
    }

    fn approval_ratio(&self) -> Decimal {
        if self.total == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.approved) / Decimal::from(self.total)
    }
}

/// Stateless evaluator for approval steps.
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Decide a step from the rule, its roster and the decisions cast so far.
    ///
    /// # Arguments
    /// * `rule` - The rule governing the step
    /// * `roster` - Approvers eligible to act in the step
    /// * `decisions` - Decisions cast so far in the step
    ///
    /// # Returns
    /// The outcome of the first condition in [`ResolutionCondition::PRECEDENCE`]
    /// that fires, or Pending. An empty roster stays Pending unless the
    /// special approver or a required veto fires.
    #[must_use]
    pub fn evaluate_step(
        rule: &ApprovalRule,
        roster: &[UserId],
        decisions: &[DecisionRecord],
    ) -> StepOutcome {
        let tally = StepTally::collect(rule, roster, decisions);

        ResolutionCondition::PRECEDENCE
            .into_iter()
            .find_map(|condition| condition.check(rule, &tally))
            .unwrap_or_else(StepOutcome::pending)
    }
}
