use super::common::*;
use crate::config::ConfigError;
use crate::workflows::reroute::approval::{
    ApprovalGate, ApprovalPolicy, GateTrigger, REASON_AUTO, REASON_COST, REASON_RISK,
};
use crate::workflows::reroute::evaluation::{AlternativeEvaluator, EvalPolicy, RerouteDecision};

fn decide(current_risk: f64, candidate_cost: f64, candidate_risk: f64) -> RerouteDecision {
    // Emissions drop sharply on the candidate so it clears the significance gate
    // even when its risk rises.
    let current = scored("route-current", metrics(90_000.0, 300.0, 40_000.0), current_risk, true);
    let candidate = scored("route-b", metrics(candidate_cost, 250.0, 1_000.0), candidate_risk, false);
    AlternativeEvaluator::new()
        .evaluate(&current, &[candidate], &EvalPolicy::default())
        .expect("valid input")
        .expect("candidate qualifies")
}

#[test]
fn cost_one_dollar_over_limit_requires_approval() {
    let policy = ApprovalPolicy::default();
    let decision = decide(0.5, policy.max_auto_cost_usd() + 1.0, 0.4);

    let result = ApprovalGate::new().gate(&decision, &policy);

    assert!(result.requires_approval);
    assert!(result.reason.contains("cost"));
    assert_eq!(result.reason, REASON_COST);
    assert_eq!(result.trigger, Some(GateTrigger::CostThreshold));
}

#[test]
fn cheaper_and_safer_change_auto_applies() {
    let decision = decide(0.5, 80_000.0, 0.3);

    let result = ApprovalGate::new().gate(&decision, &ApprovalPolicy::default());

    assert!(!result.requires_approval);
    assert_eq!(result.reason, REASON_AUTO);
    assert_eq!(result.trigger, None);
}

#[test]
fn large_risk_increase_requires_approval() {
    let decision = decide(0.2, 80_000.0, 0.45);

    let result = ApprovalGate::new().gate(&decision, &ApprovalPolicy::default());

    assert!(result.requires_approval);
    assert_eq!(result.reason, REASON_RISK);
    assert_eq!(result.trigger, Some(GateTrigger::RiskIncrease));
}

#[test]
fn small_risk_increase_is_tolerated() {
    let decision = decide(0.2, 80_000.0, 0.35);

    let result = ApprovalGate::new().gate(&decision, &ApprovalPolicy::default());

    assert!(!result.requires_approval);
}

#[test]
fn cost_rule_wins_when_both_rules_match() {
    let decision = decide(0.2, 120_000.0, 0.45);

    let result = ApprovalGate::new().gate(&decision, &ApprovalPolicy::default());

    assert_eq!(result.trigger, Some(GateTrigger::CostThreshold));
}

#[test]
fn gating_is_idempotent() {
    let decision = e2e_decision();
    let policy = ApprovalPolicy::default();
    let gate = ApprovalGate::new();

    assert_eq!(gate.gate(&decision, &policy), gate.gate(&decision, &policy));
}

#[test]
fn approval_input_names_policy_role_and_deltas() {
    let decision = e2e_decision();
    let gate = ApprovalGate::new();
    let result = gate.gate(&decision, &ApprovalPolicy::default());

    let input = gate
        .approval_input(&decision, &result)
        .expect("reference scenario is gated");

    assert_eq!(input.policy_triggered, "max_auto_cost_usd");
    assert_eq!(input.required_role, "manager");
    assert_eq!(input.cost_delta_usd, -12_000.0);
    assert!((input.risk_delta + 0.25).abs() < 1e-9);
}

#[test]
fn auto_applied_result_has_no_approval_input() {
    let decision = decide(0.5, 80_000.0, 0.3);
    let gate = ApprovalGate::new();
    let result = gate.gate(&decision, &ApprovalPolicy::default());

    assert!(gate.approval_input(&decision, &result).is_none());
}

#[test]
fn raised_cost_limit_lets_reference_scenario_through() {
    let decision = e2e_decision();
    let policy = ApprovalPolicy::new(250_000.0, 0.2).expect("valid policy");

    let result = ApprovalGate::new().gate(&decision, &policy);

    assert!(!result.requires_approval);
}

#[test]
fn negative_thresholds_are_configuration_errors() {
    assert!(matches!(
        ApprovalPolicy::new(-1.0, 0.2),
        Err(ConfigError::InvalidThreshold {
            name: "max_auto_cost_usd",
            ..
        })
    ));
    assert!(matches!(
        ApprovalPolicy::new(100_000.0, -0.2),
        Err(ConfigError::InvalidThreshold {
            name: "max_risk_increase",
            ..
        })
    ));
}
