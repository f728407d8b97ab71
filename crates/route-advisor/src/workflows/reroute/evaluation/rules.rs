use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::EvaluationError;
use crate::workflows::reroute::domain::ScoredRoute;

/// Absorbs float noise when comparing a score delta against its threshold.
pub(super) const DELTA_EPSILON: f64 = 1e-12;

pub(super) fn validate_inputs(
    current: &ScoredRoute,
    candidates: &[ScoredRoute],
) -> Result<(), EvaluationError> {
    if !current.is_current {
        return Err(EvaluationError::CurrentNotMarked(current.id.clone()));
    }
    if !current.composite_score.is_finite() {
        return Err(EvaluationError::NonFiniteScore(current.id.clone()));
    }

    let mut seen = BTreeSet::new();
    for candidate in candidates {
        if candidate.is_current {
            return Err(EvaluationError::CandidateMarkedCurrent(candidate.id.clone()));
        }
        if candidate.id == current.id {
            return Err(EvaluationError::CandidateIsCurrent(candidate.id.clone()));
        }
        if !seen.insert(&candidate.id) {
            return Err(EvaluationError::DuplicateCandidate(candidate.id.clone()));
        }
        if candidate.shipment_ref != current.shipment_ref {
            return Err(EvaluationError::FamilyMismatch {
                route: candidate.id.clone(),
                expected: current.shipment_ref.clone(),
                found: candidate.shipment_ref.clone(),
            });
        }
        if !candidate.composite_score.is_finite() {
            return Err(EvaluationError::NonFiniteScore(candidate.id.clone()));
        }
    }
    Ok(())
}

/// Best first: highest composite, then lowest cost, lowest duration, route id.
pub(super) fn preference(a: &ScoredRoute, b: &ScoredRoute) -> Ordering {
    b.composite_score
        .total_cmp(&a.composite_score)
        .then_with(|| a.metrics.cost_usd.total_cmp(&b.metrics.cost_usd))
        .then_with(|| a.metrics.duration_hours.total_cmp(&b.metrics.duration_hours))
        .then_with(|| a.id.cmp(&b.id))
}
