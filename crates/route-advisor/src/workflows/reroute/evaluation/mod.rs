mod policy;
mod rules;

pub use policy::{
    EvalPolicy, DEFAULT_HIGH_RISK_THRESHOLD, DEFAULT_MATERIAL_RISK_REDUCTION,
    DEFAULT_MIN_SCORE_DELTA,
};

use serde::Serialize;
use tracing::debug;

use super::domain::{RouteId, ScoredRoute, Severity};
use rules::{preference, validate_inputs, DELTA_EPSILON};

/// Outcome of a successful comparison: the winning alternative and how it beats the current route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerouteDecision {
    pub current: ScoredRoute,
    pub recommended: ScoredRoute,
    /// Recommended composite minus current composite. Always at least the policy minimum.
    pub score_delta: f64,
    /// Current combined risk minus recommended combined risk. Negative when risk rises.
    pub risk_reduction: f64,
    pub cost_delta_usd: f64,
    pub time_delta_hours: f64,
    pub emissions_delta_kg: f64,
    pub severity: Severity,
    pub candidates_considered: usize,
    pub candidates_qualifying: usize,
}

impl RerouteDecision {
    pub fn shipment_ref(&self) -> &str {
        &self.current.shipment_ref
    }

    /// Rise in combined risk, zero when the alternative is safer.
    pub fn risk_increase(&self) -> f64 {
        (-self.risk_reduction).max(0.0)
    }
}

/// Malformed evaluation input. Missing risk data is never one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("route {0} was supplied as the current route but is not marked current")]
    CurrentNotMarked(RouteId),
    #[error("candidate {0} is marked as a current route")]
    CandidateMarkedCurrent(RouteId),
    #[error("candidate {0} reuses the current route id")]
    CandidateIsCurrent(RouteId),
    #[error("candidate {0} appears more than once")]
    DuplicateCandidate(RouteId),
    #[error("candidate {route} belongs to shipment {found}, expected {expected}")]
    FamilyMismatch {
        route: RouteId,
        expected: String,
        found: String,
    },
    #[error("route {0} has a non-finite composite score")]
    NonFiniteScore(RouteId),
}

/// Compares a current route against scored alternatives.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlternativeEvaluator;

impl AlternativeEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// `Ok(None)` means no alternative clears the significance gate.
    pub fn evaluate(
        &self,
        current: &ScoredRoute,
        candidates: &[ScoredRoute],
        policy: &EvalPolicy,
    ) -> Result<Option<RerouteDecision>, EvaluationError> {
        validate_inputs(current, candidates)?;

        let qualifying: Vec<&ScoredRoute> = candidates
            .iter()
            .filter(|candidate| {
                candidate.composite_score - current.composite_score
                    >= policy.min_score_delta() - DELTA_EPSILON
            })
            .collect();

        let Some(best) = qualifying.iter().copied().min_by(|a, b| preference(a, b)) else {
            debug!(
                shipment = %current.shipment_ref,
                considered = candidates.len(),
                "no alternative clears the significance gate"
            );
            return Ok(None);
        };

        let risk_reduction = current.risk.combined - best.risk.combined;
        let severity = if current.risk.combined >= policy.high_risk_threshold()
            || risk_reduction >= policy.material_risk_reduction() - DELTA_EPSILON
        {
            Severity::High
        } else {
            Severity::Medium
        };

        debug!(
            shipment = %current.shipment_ref,
            recommended = %best.id,
            score_delta = best.composite_score - current.composite_score,
            severity = severity.label(),
            "alternative selected"
        );

        Ok(Some(RerouteDecision {
            current: current.clone(),
            recommended: best.clone(),
            score_delta: best.composite_score - current.composite_score,
            risk_reduction,
            cost_delta_usd: best.metrics.cost_usd - current.metrics.cost_usd,
            time_delta_hours: best.metrics.duration_hours - current.metrics.duration_hours,
            emissions_delta_kg: best.metrics.emissions_kg - current.metrics.emissions_kg,
            severity,
            candidates_considered: candidates.len(),
            candidates_qualifying: qualifying.len(),
        }))
    }
}
