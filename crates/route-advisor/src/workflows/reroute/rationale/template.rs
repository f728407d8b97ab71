use std::collections::BTreeMap;

use crate::workflows::reroute::domain::{
    FallbackReason, Rationale, ShipmentContext, FALLBACK_MODEL,
};
use crate::workflows::reroute::evaluation::RerouteDecision;

/// Fixed confidence for templated rationales, distinct from any generated value.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

const TOP_FACTORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Factor {
    Cost,
    Time,
    Emissions,
    Risk,
}

impl Factor {
    /// Also the tie order when two factors move by the same amount.
    const ALL: [Factor; 4] = [Factor::Cost, Factor::Time, Factor::Emissions, Factor::Risk];

    /// Normalized sub-score movement, so the four metrics share one scale.
    fn magnitude(self, decision: &RerouteDecision) -> f64 {
        let current = &decision.current.sub_scores;
        let recommended = &decision.recommended.sub_scores;
        let delta = match self {
            Factor::Cost => recommended.cost - current.cost,
            Factor::Time => recommended.time - current.time,
            Factor::Emissions => recommended.emissions - current.emissions,
            Factor::Risk => recommended.risk - current.risk,
        };
        delta.abs()
    }

    fn describe(self, decision: &RerouteDecision) -> String {
        let current = &decision.current;
        let recommended = &decision.recommended;
        match self {
            Factor::Cost => format!(
                "cost {} by ${:.0} (${:.0} -> ${:.0})",
                direction(decision.cost_delta_usd, "lower", "higher"),
                decision.cost_delta_usd.abs(),
                current.metrics.cost_usd,
                recommended.metrics.cost_usd
            ),
            Factor::Time => format!(
                "transit time {} by {:.1}h ({:.1}h -> {:.1}h)",
                direction(decision.time_delta_hours, "shorter", "longer"),
                decision.time_delta_hours.abs(),
                current.metrics.duration_hours,
                recommended.metrics.duration_hours
            ),
            Factor::Emissions => format!(
                "emissions {} by {:.0} kg ({:.0} kg -> {:.0} kg)",
                direction(decision.emissions_delta_kg, "lower", "higher"),
                decision.emissions_delta_kg.abs(),
                current.metrics.emissions_kg,
                recommended.metrics.emissions_kg
            ),
            Factor::Risk => format!(
                "combined risk {} by {:.2} ({:.2} -> {:.2})",
                direction(-decision.risk_reduction, "lower", "higher"),
                decision.risk_reduction.abs(),
                current.risk.combined,
                recommended.risk.combined
            ),
        }
    }
}

fn direction(delta: f64, down: &'static str, up: &'static str) -> &'static str {
    if delta <= 0.0 {
        down
    } else {
        up
    }
}

/// The largest movers first; ties keep `Factor::ALL` order.
pub(super) fn ranked_factors(decision: &RerouteDecision) -> Vec<Factor> {
    let mut factors = Factor::ALL.to_vec();
    factors.sort_by(|a, b| b.magnitude(decision).total_cmp(&a.magnitude(decision)));
    factors.truncate(TOP_FACTORS);
    factors
}

/// Numeric improvements every rationale carries, generated or not.
pub(super) fn baseline_improvements(decision: &RerouteDecision) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("score_delta".to_string(), decision.score_delta),
        ("risk_reduction".to_string(), decision.risk_reduction),
        ("cost_delta_usd".to_string(), decision.cost_delta_usd),
        ("time_delta_hours".to_string(), decision.time_delta_hours),
        ("emissions_delta_kg".to_string(), decision.emissions_delta_kg),
    ])
}

pub(super) fn fallback_rationale(
    shipment: &ShipmentContext,
    decision: &RerouteDecision,
    reason: FallbackReason,
) -> Rationale {
    let factors: Vec<String> = ranked_factors(decision)
        .into_iter()
        .map(|factor| factor.describe(decision))
        .collect();

    let text = format!(
        "Reroute shipment {} from {} to {}: composite score improves by {:.3} ({:.3} -> {:.3}). Leading factors: {}.",
        shipment.reference,
        decision.current.display_name(),
        decision.recommended.display_name(),
        decision.score_delta,
        decision.current.composite_score,
        decision.recommended.composite_score,
        factors.join("; ")
    );

    Rationale {
        text,
        factors,
        model: FALLBACK_MODEL.to_string(),
        improvements: baseline_improvements(decision),
        confidence: FALLBACK_CONFIDENCE,
        fallback_reason: Some(reason),
    }
}
