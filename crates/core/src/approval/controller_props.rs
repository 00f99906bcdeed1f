//! Property-based tests for WorkflowController.
//!
//! Random decision walks over multi-step expenses check that steps are
//! taken strictly in order, that the decision log only grows, and that a
//! terminal expense never changes again.

use claimflow_shared::{CompanyId, ExpenseId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::approval::controller::WorkflowController;
use crate::approval::error::ApprovalError;
use crate::approval::rule::ApprovalRule;
use crate::approval::state::{DecisionRecord, ExpenseApprovalState};
use crate::approval::types::{Decision, ExpenseStatus, StepStatus};

/// One attempted decision in a walk.
#[derive(Debug, Clone)]
struct Attempt {
    /// Target the active step, or guess an index.
    on_current_step: bool,
    step_guess: usize,
    /// Index into the active roster; past the end means an outsider.
    pick: usize,
    decision: Decision,
}

fn arb_status() -> impl Strategy<Value = ExpenseStatus> {
    prop_oneof![
        Just(ExpenseStatus::Draft),
        Just(ExpenseStatus::Submitted),
        Just(ExpenseStatus::Pending),
        Just(ExpenseStatus::Approved),
        Just(ExpenseStatus::Rejected),
        Just(ExpenseStatus::Paid),
    ]
}

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Approved), Just(Decision::Rejected)]
}

fn arb_threshold() -> impl Strategy<Value = Decimal> {
    prop_oneof![Just(Decimal::ZERO), Just(dec!(0.5)), Just(Decimal::ONE)]
}

/// Step sizes paired with per-approver required flags.
fn arb_steps() -> impl Strategy<Value = Vec<Vec<bool>>> {
    prop::collection::vec(prop::collection::vec(any::<bool>(), 1..=4), 1..=3)
}

fn arb_attempt() -> impl Strategy<Value = Attempt> {
    (prop::bool::weighted(0.9), 0usize..4, 0usize..6, arb_decision()).prop_map(
        |(on_current_step, step_guess, pick, decision)| Attempt {
            on_current_step,
            step_guess,
            pick,
            decision,
        },
    )
}

fn opened(steps: &[Vec<bool>], threshold: Decimal, sequential: bool) -> ExpenseApprovalState {
    let rosters: Vec<Vec<UserId>> = steps
        .iter()
        .map(|flags| flags.iter().map(|_| UserId::new()).collect())
        .collect();

    let mut rule =
        ApprovalRule::new(CompanyId::new(), "Walk").with_min_approval_percentage(threshold);
    for (roster, flags) in rosters.iter().zip(steps) {
        for (id, required) in roster.iter().zip(flags) {
            rule = rule.with_approver(*id, *required, 0);
        }
    }
    if sequential {
        rule = rule.sequential();
    }

    let draft = ExpenseApprovalState::new(ExpenseId::new(), rule);
    let submitted = WorkflowController::submit(&draft).unwrap();
    WorkflowController::open(&submitted, rosters).unwrap()
}

fn with_status(status: ExpenseStatus) -> ExpenseApprovalState {
    let rule = ApprovalRule::new(CompanyId::new(), "Any");
    let mut state = ExpenseApprovalState::new(ExpenseId::new(), rule);
    state.status = status;
    state
}

fn total_decisions(state: &ExpenseApprovalState) -> usize {
    state.steps().iter().map(|s| s.decisions().len()).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Submit succeeds exactly from Draft.
    #[test]
    fn prop_submit_only_from_draft(status in arb_status()) {
        let state = with_status(status);
        let result = WorkflowController::submit(&state);
        prop_assert_eq!(result.is_ok(), status == ExpenseStatus::Draft);
        prop_assert_eq!(
            result.is_ok(),
            WorkflowController::is_valid_transition(status, ExpenseStatus::Submitted)
        );
    }

    /// Paid is reachable exactly from Approved.
    #[test]
    fn prop_mark_paid_only_from_approved(status in arb_status()) {
        let state = with_status(status);
        let result = WorkflowController::mark_paid(&state);
        prop_assert_eq!(result.is_ok(), status == ExpenseStatus::Approved);
        if let Err(err) = result {
            let is_invalid_transition = matches!(err, ApprovalError::InvalidTransition { .. });
            prop_assert!(is_invalid_transition);
        }
    }

    /// Terminal statuses never transition back into the workflow.
    #[test]
    fn prop_terminal_status_is_final(from in arb_status(), to in arb_status()) {
        if from.is_terminal() && WorkflowController::is_valid_transition(from, to) {
            prop_assert_eq!((from, to), (ExpenseStatus::Approved, ExpenseStatus::Paid));
        }
    }

    /// Walk random decisions through an opened expense.
    #[test]
    fn prop_decision_walk_invariants(
        steps in arb_steps(),
        threshold in arb_threshold(),
        sequential in any::<bool>(),
        attempts in prop::collection::vec(arb_attempt(), 1..24),
    ) {
        let mut state = opened(&steps, threshold, sequential);

        for attempt in attempts {
            let was_terminal = state.is_terminal();
            let before = state.clone();
            let index = if attempt.on_current_step {
                state.current_step_index()
            } else {
                attempt.step_guess
            };
            let roster = state.steps()[state.current_step_index()].roster().to_vec();
            let approver = roster.get(attempt.pick).copied().unwrap_or_else(UserId::new);

            let result = WorkflowController::record_decision(
                &state,
                index,
                DecisionRecord::new(approver, attempt.decision),
            );

            match result {
                Err(ApprovalError::InvalidStep { .. }) => {
                    prop_assert!(was_terminal || index != before.current_step_index());
                }
                Err(ApprovalError::DuplicateDecision { approver_id, step_index }) => {
                    prop_assert_eq!(approver_id, approver);
                    prop_assert!(before.steps()[step_index].has_decided(approver));
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                Ok((next, outcome)) => {
                    prop_assert!(!was_terminal);
                    prop_assert_eq!(index, before.current_step_index());

                    // Exactly one record appended, to the step it targeted.
                    prop_assert_eq!(total_decisions(&next), total_decisions(&before) + 1);
                    let log = next.steps()[index].decisions();
                    prop_assert_eq!(&log[..log.len() - 1], before.steps()[index].decisions());
                    prop_assert_eq!(log[log.len() - 1].approver_id, approver);

                    // Steps advance one at a time.
                    let advanced = next.current_step_index() - before.current_step_index();
                    prop_assert!(advanced <= 1);
                    prop_assert_eq!(next.steps()[index].status(), outcome.status);

                    match outcome.status {
                        StepStatus::Pending => {
                            prop_assert_eq!(next.status(), ExpenseStatus::Pending);
                            prop_assert_eq!(advanced, 0);
                        }
                        StepStatus::Rejected => {
                            prop_assert_eq!(next.status(), ExpenseStatus::Rejected);
                            prop_assert_eq!(advanced, 0);
                        }
                        StepStatus::Approved if index + 1 < next.steps().len() => {
                            prop_assert_eq!(next.status(), ExpenseStatus::Pending);
                            prop_assert_eq!(advanced, 1);
                        }
                        StepStatus::Approved => {
                            prop_assert_eq!(next.status(), ExpenseStatus::Approved);
                            prop_assert_eq!(advanced, 0);
                        }
                    }
                    state = next;
                }
            }

            // Steps ahead of the active one are untouched.
            for step in &state.steps()[state.current_step_index() + 1..] {
                prop_assert!(step.decisions().is_empty());
                prop_assert_eq!(step.status(), StepStatus::Pending);
            }
            // Steps behind it resolved Approved.
            for step in &state.steps()[..state.current_step_index()] {
                prop_assert_eq!(step.status(), StepStatus::Approved);
            }
            if state.status() == ExpenseStatus::Approved {
                prop_assert!(state.steps().iter().all(|s| s.status() == StepStatus::Approved));
            }
        }
    }

    /// Once terminal, every decision is refused and the state is unchanged.
    #[test]
    fn prop_terminal_state_refuses_decisions(
        flags in prop::collection::vec(any::<bool>(), 1..=4),
        reject in any::<bool>(),
        late in arb_decision(),
    ) {
        let state = opened(std::slice::from_ref(&flags), Decimal::ZERO, false);
        let roster = state.steps()[0].roster().to_vec();

        // Force a terminal outcome: a veto when one exists, else unanimity.
        let veto = roster.iter().zip(&flags).find(|(_, required)| **required).map(|(id, _)| *id);
        let state = match (reject, veto) {
            (true, Some(id)) => {
                WorkflowController::record_decision(&state, 0, DecisionRecord::reject(id)).unwrap().0
            }
            _ => roster.iter().fold(state, |s, id| {
                WorkflowController::record_decision(&s, 0, DecisionRecord::approve(*id)).unwrap().0
            }),
        };
        prop_assert!(state.is_terminal());

        let snapshot = state.clone();
        let result = WorkflowController::record_decision(&state, 0, DecisionRecord::new(UserId::new(), late));
        let is_invalid_step = matches!(result, Err(ApprovalError::InvalidStep { .. }));
        prop_assert!(is_invalid_step);
        prop_assert_eq!(state, snapshot);
    }
}
