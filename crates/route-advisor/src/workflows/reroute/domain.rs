use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for a route (current or candidate).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub String);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for an emitted recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecommendationId(pub String);

impl fmt::Display for RecommendationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// One stop or turning point along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Free-form tag such as "port", "canal", or "waypoint".
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub port_code: Option<String>,
}

impl Waypoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }

    pub fn is_port(&self) -> bool {
        self.kind
            .as_deref()
            .map(|kind| kind.trim().eq_ignore_ascii_case("port"))
            .unwrap_or(false)
    }
}

/// Raw per-route metrics. Missing fields deserialize to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteMetrics {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub cost_usd: f64,
    pub emissions_kg: f64,
}

impl RouteMetrics {
    pub fn validate(&self, route: &RouteId) -> Result<(), InputError> {
        for (field, value) in [
            ("distance_km", self.distance_km),
            ("duration_hours", self.duration_hours),
            ("cost_usd", self.cost_usd),
            ("emissions_kg", self.emissions_kg),
        ] {
            if !value.is_finite() {
                return Err(InputError::NonFiniteMetric {
                    route: route.clone(),
                    field,
                });
            }
            if value < 0.0 {
                return Err(InputError::NegativeMetric {
                    route: route.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Risk domains combined by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDomain {
    Weather,
    Geopolitical,
    Maritime,
}

impl RiskDomain {
    pub const fn label(self) -> &'static str {
        match self {
            RiskDomain::Weather => "weather",
            RiskDomain::Geopolitical => "geopolitical",
            RiskDomain::Maritime => "maritime",
        }
    }
}

/// Per-domain risk in [0,1] plus the weighted combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub weather: f64,
    pub geopolitical: f64,
    pub maritime: f64,
    pub combined: f64,
    /// Domains whose value is a documented default rather than provider data.
    #[serde(default)]
    pub degraded: Vec<RiskDomain>,
}

impl RiskBreakdown {
    /// Wrap a point prediction from an upstream model. The model reports a single
    /// probability, so every domain mirrors it.
    pub fn from_prediction(combined: f64) -> Self {
        let combined = combined.clamp(0.0, 1.0);
        Self {
            weather: combined,
            geopolitical: combined,
            maritime: combined,
            combined,
            degraded: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Normalized sub-scores, higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub cost: f64,
    pub time: f64,
    pub risk: f64,
    pub emissions: f64,
    pub reliability: f64,
}

/// Caller-supplied description of one route to be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub id: RouteId,
    #[serde(default)]
    pub name: String,
    /// Shipment this route was generated for; must match the evaluated shipment when set.
    #[serde(default)]
    pub shipment_ref: Option<String>,
    #[serde(default)]
    pub metrics: RouteMetrics,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub reliability: Option<f64>,
    /// Combined risk probability from a prediction provider; skips live aggregation.
    #[serde(default)]
    pub predicted_risk: Option<f64>,
}

impl RouteCandidate {
    pub fn validate(&self, shipment_ref: &str) -> Result<(), InputError> {
        if self.id.0.trim().is_empty() {
            return Err(InputError::EmptyRouteId);
        }
        self.metrics.validate(&self.id)?;
        if let Some(found) = &self.shipment_ref {
            if found != shipment_ref {
                return Err(InputError::ShipmentMismatch {
                    route: self.id.clone(),
                    expected: shipment_ref.to_string(),
                    found: found.clone(),
                });
            }
        }
        if self
            .waypoints
            .iter()
            .any(|waypoint| !waypoint.lat.is_finite() || !waypoint.lon.is_finite())
        {
            return Err(InputError::NonFiniteCoordinate {
                route: self.id.clone(),
            });
        }
        for (field, value) in [
            ("reliability", self.reliability),
            ("predicted_risk", self.predicted_risk),
        ] {
            if matches!(value, Some(value) if !value.is_finite()) {
                return Err(InputError::NonFiniteMetric {
                    route: self.id.clone(),
                    field,
                });
            }
        }
        Ok(())
    }
}

/// A route after scoring. Produced once by the scorer and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRoute {
    pub id: RouteId,
    pub name: String,
    pub shipment_ref: String,
    pub metrics: RouteMetrics,
    pub risk: RiskBreakdown,
    pub sub_scores: SubScores,
    pub composite_score: f64,
    pub is_current: bool,
    pub scored_at: DateTime<Utc>,
    /// Feeds the score drew on, e.g. `internal_metrics`, `weather_api`.
    #[serde(default)]
    pub data_sources: Vec<String>,
}

impl ScoredRoute {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id.0
        } else {
            &self.name
        }
    }
}

/// Shipment details used for prompts, subject references, and audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentContext {
    pub reference: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub cargo_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    Reroute,
    Reorder,
    Negotiate,
    Hold,
    Expedite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Role that must sign off on a gated recommendation of this severity.
    pub const fn approver_role(self) -> &'static str {
        match self {
            Severity::Critical => "director",
            Severity::High => "manager",
            Severity::Medium | Severity::Low => "analyst",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationStatus {
    Pending,
    Approved,
    Rejected,
    Implemented,
}

impl RecommendationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RecommendationStatus::Pending => "PENDING",
            RecommendationStatus::Approved => "APPROVED",
            RecommendationStatus::Rejected => "REJECTED",
            RecommendationStatus::Implemented => "IMPLEMENTED",
        }
    }

    pub const fn can_transition_to(self, next: RecommendationStatus) -> bool {
        matches!(
            (self, next),
            (RecommendationStatus::Pending, RecommendationStatus::Approved)
                | (RecommendationStatus::Pending, RecommendationStatus::Rejected)
                | (RecommendationStatus::Approved, RecommendationStatus::Implemented)
        )
    }
}

/// Model identifier stamped on rationales produced without a live explainer.
pub const FALLBACK_MODEL: &str = "deterministic-fallback";

/// Why a rationale was produced by the deterministic template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    Disabled,
    Unavailable,
    TimedOut,
    Failed,
    Unparseable,
}

impl FallbackReason {
    pub const fn label(self) -> &'static str {
        match self {
            FallbackReason::Disabled => "disabled",
            FallbackReason::Unavailable => "unavailable",
            FallbackReason::TimedOut => "timed_out",
            FallbackReason::Failed => "failed",
            FallbackReason::Unparseable => "unparseable",
        }
    }
}

/// Structured justification attached to a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rationale {
    pub text: String,
    pub factors: Vec<String>,
    pub model: String,
    pub improvements: BTreeMap<String, f64>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl Rationale {
    pub fn is_fallback(&self) -> bool {
        self.model == FALLBACK_MODEL
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecommendationId,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub subject_ref: String,
    pub severity: Severity,
    pub confidence: f64,
    pub rationale: Rationale,
    pub status: RecommendationStatus,
    pub created_at: DateTime<Utc>,
    pub current_route: RouteId,
    pub recommended_route: RouteId,
}

impl Recommendation {
    pub fn transition(&mut self, next: RecommendationStatus) -> Result<(), LifecycleError> {
        if !self.status.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Payload handed to the approval workflow when the gate holds a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDecisionInput {
    pub policy_triggered: String,
    pub required_role: String,
    pub cost_delta_usd: f64,
    pub risk_delta: f64,
}

/// Approval record shape accepted by the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub policy_triggered: String,
    pub required_role: String,
    pub related_recommendation_id: RecommendationId,
    pub reason: String,
    pub cost_delta_usd: f64,
    pub risk_delta: f64,
    pub requested_at: DateTime<Utc>,
}

/// External sign-off outcome for a pending recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalVerdict {
    Approved,
    Rejected,
}

impl From<ApprovalVerdict> for RecommendationStatus {
    fn from(value: ApprovalVerdict) -> Self {
        match value {
            ApprovalVerdict::Approved => RecommendationStatus::Approved,
            ApprovalVerdict::Rejected => RecommendationStatus::Rejected,
        }
    }
}

/// Malformed route or shipment data. Surfaced to callers, never guessed around.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("route id must not be empty")]
    EmptyRouteId,
    #[error("shipment reference must not be empty")]
    EmptyShipmentRef,
    #[error("route {route} has negative {field} ({value})")]
    NegativeMetric {
        route: RouteId,
        field: &'static str,
        value: f64,
    },
    #[error("route {route} has a non-finite {field}")]
    NonFiniteMetric { route: RouteId, field: &'static str },
    #[error("route {route} has a waypoint with non-finite coordinates")]
    NonFiniteCoordinate { route: RouteId },
    #[error("route {route} belongs to shipment {found}, expected {expected}")]
    ShipmentMismatch {
        route: RouteId,
        expected: String,
        found: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("recommendation cannot move from {} to {}", .from.label(), .to.label())]
    InvalidTransition {
        from: RecommendationStatus,
        to: RecommendationStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_metrics_deserialize_to_zero() {
        let metrics: RouteMetrics =
            serde_json::from_str(r#"{"cost_usd": 1200.0}"#).expect("partial metrics parse");
        assert_eq!(metrics.cost_usd, 1200.0);
        assert_eq!(metrics.duration_hours, 0.0);
        assert_eq!(metrics.emissions_kg, 0.0);
    }

    #[test]
    fn negative_cost_is_an_input_error() {
        let metrics = RouteMetrics {
            cost_usd: -5.0,
            ..RouteMetrics::default()
        };
        let err = metrics
            .validate(&RouteId("r-1".to_string()))
            .expect_err("negative cost rejected");
        assert!(matches!(
            err,
            InputError::NegativeMetric {
                field: "cost_usd",
                ..
            }
        ));
    }

    #[test]
    fn waypoint_port_tag_is_case_insensitive() {
        let waypoint: Waypoint =
            serde_json::from_str(r#"{"name":"Port of Singapore","lat":1.26,"lon":103.84,"type":"Port"}"#)
                .expect("waypoint parses");
        assert!(waypoint.is_port());
    }

    #[test]
    fn lifecycle_allows_only_forward_transitions() {
        assert!(RecommendationStatus::Pending.can_transition_to(RecommendationStatus::Approved));
        assert!(RecommendationStatus::Approved.can_transition_to(RecommendationStatus::Implemented));
        assert!(!RecommendationStatus::Pending.can_transition_to(RecommendationStatus::Implemented));
        assert!(!RecommendationStatus::Rejected.can_transition_to(RecommendationStatus::Approved));
    }

    #[test]
    fn severity_maps_to_approver_roles() {
        assert_eq!(Severity::Critical.approver_role(), "director");
        assert_eq!(Severity::High.approver_role(), "manager");
        assert_eq!(Severity::Medium.approver_role(), "analyst");
    }
}
