//! Reroute advisory pipeline.
//!
//! Data flows leaf-first: risk aggregation, per-route scoring, comparison
//! against the current route, explanation, approval gating, and finally
//! emission of a recommendation to the store.

pub mod approval;
pub mod cache;
pub mod domain;
pub mod evaluation;
pub mod rationale;
pub mod repository;
pub mod risk;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use approval::{ApprovalGate, ApprovalPolicy, GateResult, GateTrigger};
pub use cache::PredictionCache;
pub use domain::{
    ApprovalDecisionInput, ApprovalRequest, ApprovalVerdict, Coordinate, FallbackReason,
    InputError, LifecycleError, Rationale, Recommendation, RecommendationId,
    RecommendationStatus, RecommendationType, RiskBreakdown, RiskDomain, RouteCandidate, RouteId,
    RouteMetrics, ScoredRoute, Severity, ShipmentContext, SubScores, Waypoint, FALLBACK_MODEL,
};
pub use evaluation::{AlternativeEvaluator, EvalPolicy, EvaluationError, RerouteDecision};
pub use rationale::{
    ExplainerError, ExplainerSettings, GenerativeExplainer, RationaleBuilder, FALLBACK_CONFIDENCE,
};
pub use repository::{AuditError, AuditSink, RationaleAudit, RecommendationStore, StoreError};
pub use risk::{
    GeopoliticalProvider, MaritimeProvider, PortConditions, ProviderError, RiskSignalAggregator,
    RiskSources, SegmentAssessment, WeatherProvider, WeatherReading,
};
pub use scoring::{RiskDomainWeights, RouteScorer, ScoringWeights};
pub use service::{
    EvaluationOutcome, RerouteAdvisor, RerouteServiceError, ShipmentEvaluation, SweepResult,
};
