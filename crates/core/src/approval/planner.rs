//! Step planning from an approval rule.
//!
//! Turns a rule and the submitter's manager into the ordered rosters that
//! `WorkflowController::open` expects.

use claimflow_shared::{ApprovalConfig, UserId};

use crate::approval::error::ApprovalError;
use crate::approval::rule::ApprovalRule;

/// Options controlling step planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningOptions {
    /// Drop the manager step when the submitter has no manager.
    pub skip_missing_manager: bool,
}

impl Default for PlanningOptions {
    fn default() -> Self {
        Self {
            skip_missing_manager: true,
        }
    }
}

impl From<&ApprovalConfig> for PlanningOptions {
    fn from(config: &ApprovalConfig) -> Self {
        Self {
            skip_missing_manager: config.skip_missing_manager,
        }
    }
}

/// Stateless planner for approval step rosters.
pub struct StepPlanner;

impl StepPlanner {
    /// Plan the rosters of every step.
    ///
    /// - A manager-first rule opens with `[manager]`. A sequential rule
    ///   follows it with the panel; a parallel rule stops there.
    /// - Otherwise the panel is the only step.
    /// - The panel keeps `sequence` order (stable) for sequential rules and
    ///   configured order for parallel ones.
    ///
    /// When a manager-first rule has no manager and `skip_missing_manager`
    /// is on, the panel takes the manager step's place.
    ///
    /// # Errors
    /// * `InvalidRule` if the rule is malformed
    /// * `ManagerNotFound` if the rule is manager-first, no manager is known,
    ///   and `skip_missing_manager` is off
    /// * `EmptyRoster` if the plan has no steps
    pub fn plan(
        rule: &ApprovalRule,
        manager: Option<UserId>,
        options: PlanningOptions,
    ) -> Result<Vec<Vec<UserId>>, ApprovalError> {
        rule.validate()?;

        let panel = Self::panel(rule);
        let mut rosters = Vec::new();

        match (rule.is_manager_approver, manager) {
            (true, Some(manager)) => {
                rosters.push(vec![manager]);
                if rule.sequential && !panel.is_empty() {
                    rosters.push(panel);
                }
            }
            (true, None) if !options.skip_missing_manager => {
                return Err(ApprovalError::ManagerNotFound);
            }
            _ if !panel.is_empty() => rosters.push(panel),
            _ => {}
        }

        if rosters.is_empty() {
            return Err(ApprovalError::EmptyRoster { step_index: 0 });
        }

        Ok(rosters)
    }

    fn panel(rule: &ApprovalRule) -> Vec<UserId> {
        if !rule.sequential {
            return rule.approver_ids();
        }
        let mut approvers: Vec<_> = rule.approvers.iter().collect();
        approvers.sort_by_key(|a| a.sequence);
        approvers.into_iter().map(|a| a.approver_id).collect()
    }
}
