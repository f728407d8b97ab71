//! Composite route scoring.
//!
//! Raw metrics are normalized against fixed reference ceilings rather than the
//! candidate set, so a route's score never depends on which alternatives it is
//! compared with.

mod weights;

pub use weights::{RiskDomainWeights, ScoringWeights, WEIGHT_TOLERANCE};

use chrono::Utc;

use super::domain::{
    InputError, RiskBreakdown, RouteCandidate, RouteMetrics, ScoredRoute, SubScores,
};
use crate::config::ConfigError;

pub const COST_CEILING_USD: f64 = 500_000.0;
pub const DURATION_CEILING_HOURS: f64 = 720.0;
pub const EMISSIONS_CEILING_KG: f64 = 50_000.0;
pub const RELIABILITY_BASELINE: f64 = 0.8;

/// `1 - raw/ceiling`, floored at zero.
pub fn normalize(raw: f64, ceiling: f64) -> f64 {
    (1.0 - raw / ceiling).clamp(0.0, 1.0)
}

/// Stateless scorer holding validated weights.
#[derive(Debug, Clone)]
pub struct RouteScorer {
    weights: ScoringWeights,
    reliability_baseline: f64,
}

impl Default for RouteScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

impl RouteScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            weights,
            reliability_baseline: RELIABILITY_BASELINE,
        }
    }

    pub fn with_reliability_baseline(mut self, baseline: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&baseline) {
            return Err(ConfigError::InvalidThreshold {
                name: "reliability_baseline",
                value: baseline,
            });
        }
        self.reliability_baseline = baseline;
        Ok(self)
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn sub_scores(
        &self,
        metrics: &RouteMetrics,
        risk: &RiskBreakdown,
        reliability: Option<f64>,
    ) -> SubScores {
        SubScores {
            cost: normalize(metrics.cost_usd, COST_CEILING_USD),
            time: normalize(metrics.duration_hours, DURATION_CEILING_HOURS),
            risk: (1.0 - risk.combined).clamp(0.0, 1.0),
            emissions: normalize(metrics.emissions_kg, EMISSIONS_CEILING_KG),
            reliability: reliability
                .map(|value| value.clamp(0.0, 1.0))
                .unwrap_or(self.reliability_baseline),
        }
    }

    pub fn composite(&self, sub_scores: &SubScores) -> f64 {
        let weights = &self.weights;
        (sub_scores.cost * weights.cost()
            + sub_scores.time * weights.time()
            + sub_scores.risk * weights.risk()
            + sub_scores.emissions * weights.emissions()
            + sub_scores.reliability * weights.reliability())
        .clamp(0.0, 1.0)
    }

    /// Score one route. `scored_at` and `data_sources` are metadata only and never feed the score.
    pub fn score(
        &self,
        candidate: &RouteCandidate,
        shipment_ref: &str,
        risk: RiskBreakdown,
        data_sources: &[&str],
        is_current: bool,
    ) -> Result<ScoredRoute, InputError> {
        candidate.validate(shipment_ref)?;

        let sub_scores = self.sub_scores(&candidate.metrics, &risk, candidate.reliability);
        let composite_score = self.composite(&sub_scores);

        Ok(ScoredRoute {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            shipment_ref: shipment_ref.to_string(),
            metrics: candidate.metrics,
            risk,
            sub_scores,
            composite_score,
            is_current,
            scored_at: Utc::now(),
            data_sources: data_sources.iter().map(|source| source.to_string()).collect(),
        })
    }
}
