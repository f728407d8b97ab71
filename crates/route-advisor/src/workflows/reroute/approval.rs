use serde::{Deserialize, Serialize};

use super::domain::ApprovalDecisionInput;
use super::evaluation::RerouteDecision;
use crate::config::ConfigError;

pub const DEFAULT_MAX_AUTO_COST_USD: f64 = 100_000.0;
pub const DEFAULT_MAX_RISK_INCREASE: f64 = 0.2;

pub const REASON_COST: &str = "cost exceeds threshold";
pub const REASON_RISK: &str = "risk increases significantly";
pub const REASON_AUTO: &str = "within auto-approval limits";

/// Limits under which a reroute may apply without human sign-off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApprovalPolicy {
    max_auto_cost_usd: f64,
    max_risk_increase: f64,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            max_auto_cost_usd: DEFAULT_MAX_AUTO_COST_USD,
            max_risk_increase: DEFAULT_MAX_RISK_INCREASE,
        }
    }
}

impl ApprovalPolicy {
    pub fn new(max_auto_cost_usd: f64, max_risk_increase: f64) -> Result<Self, ConfigError> {
        if !max_auto_cost_usd.is_finite() || max_auto_cost_usd < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "max_auto_cost_usd",
                value: max_auto_cost_usd,
            });
        }
        if !max_risk_increase.is_finite() || !(0.0..=1.0).contains(&max_risk_increase) {
            return Err(ConfigError::InvalidThreshold {
                name: "max_risk_increase",
                value: max_risk_increase,
            });
        }
        Ok(Self {
            max_auto_cost_usd,
            max_risk_increase,
        })
    }

    pub fn max_auto_cost_usd(&self) -> f64 {
        self.max_auto_cost_usd
    }

    pub fn max_risk_increase(&self) -> f64 {
        self.max_risk_increase
    }
}

/// Which rule held the change for approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateTrigger {
    CostThreshold,
    RiskIncrease,
}

impl GateTrigger {
    /// Policy name written to approval requests.
    pub const fn policy_name(self) -> &'static str {
        match self {
            GateTrigger::CostThreshold => "max_auto_cost_usd",
            GateTrigger::RiskIncrease => "max_risk_increase",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub requires_approval: bool,
    pub reason: String,
    pub trigger: Option<GateTrigger>,
}

impl GateResult {
    fn held(trigger: GateTrigger, reason: &str) -> Self {
        Self {
            requires_approval: true,
            reason: reason.to_string(),
            trigger: Some(trigger),
        }
    }

    fn auto_apply() -> Self {
        Self {
            requires_approval: false,
            reason: REASON_AUTO.to_string(),
            trigger: None,
        }
    }
}

/// Pure policy check. Creates no records; the caller acts on the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovalGate;

impl ApprovalGate {
    pub fn new() -> Self {
        Self
    }

    /// Rules run in order and the first match wins.
    pub fn gate(&self, decision: &RerouteDecision, policy: &ApprovalPolicy) -> GateResult {
        if decision.recommended.metrics.cost_usd > policy.max_auto_cost_usd() {
            return GateResult::held(GateTrigger::CostThreshold, REASON_COST);
        }
        if decision.risk_increase() > policy.max_risk_increase() {
            return GateResult::held(GateTrigger::RiskIncrease, REASON_RISK);
        }
        GateResult::auto_apply()
    }

    /// Payload for the approval workflow, or `None` when the result auto-applies.
    pub fn approval_input(
        &self,
        decision: &RerouteDecision,
        result: &GateResult,
    ) -> Option<ApprovalDecisionInput> {
        let trigger = result.trigger.filter(|_| result.requires_approval)?;
        Some(ApprovalDecisionInput {
            policy_triggered: trigger.policy_name().to_string(),
            required_role: decision.severity.approver_role().to_string(),
            cost_delta_usd: decision.cost_delta_usd,
            risk_delta: -decision.risk_reduction,
        })
    }
}
