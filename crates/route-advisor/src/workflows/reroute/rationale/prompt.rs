use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::reroute::domain::{RiskBreakdown, RouteMetrics, ScoredRoute, ShipmentContext};
use crate::workflows::reroute::evaluation::RerouteDecision;

const PREAMBLE: &str = "You are a logistics analyst. Explain why the recommended route should \
replace the current route for the shipment below. Respond with a single JSON object with the \
fields \"rationale\" (string), \"factors\" (array of strings), \"recommended_route\" (the \
recommended route id), \"improvements\" (object of metric name to number) and \"confidence\" \
(number between 0 and 1).";

#[derive(Serialize)]
struct RouteSummary<'a> {
    id: &'a str,
    name: &'a str,
    metrics: &'a RouteMetrics,
    risk: &'a RiskBreakdown,
    composite_score: f64,
}

impl<'a> From<&'a ScoredRoute> for RouteSummary<'a> {
    fn from(route: &'a ScoredRoute) -> Self {
        Self {
            id: &route.id.0,
            name: route.display_name(),
            metrics: &route.metrics,
            risk: &route.risk,
            composite_score: route.composite_score,
        }
    }
}

#[derive(Serialize)]
struct PromptPayload<'a> {
    shipment: &'a ShipmentContext,
    current_route: RouteSummary<'a>,
    recommended_route: RouteSummary<'a>,
    score_delta: f64,
    risk_reduction: f64,
    severity: &'static str,
}

pub(super) fn build_prompt(
    shipment: &ShipmentContext,
    decision: &RerouteDecision,
) -> Result<String, serde_json::Error> {
    let payload = PromptPayload {
        shipment,
        current_route: RouteSummary::from(&decision.current),
        recommended_route: RouteSummary::from(&decision.recommended),
        score_delta: decision.score_delta,
        risk_reduction: decision.risk_reduction,
        severity: decision.severity.label(),
    };
    let body = serde_json::to_string_pretty(&payload)?;
    Ok(format!("{PREAMBLE}\n\n{body}"))
}

/// Structured reply expected from a generative explainer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExplainerResponse {
    pub rationale: String,
    #[serde(default)]
    pub factors: Vec<String>,
    #[serde(default, alias = "recommendedRouteRef", alias = "recommended_route_id")]
    pub recommended_route: Option<String>,
    #[serde(default)]
    pub improvements: BTreeMap<String, f64>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResponseError {
    #[error("response contains no JSON object")]
    NoJsonObject,
    #[error("response JSON is malformed: {0}")]
    Malformed(String),
    #[error("response rationale is empty")]
    EmptyRationale,
    #[error("response lists no factors")]
    NoFactors,
    #[error("response recommends {found}, decision selected {expected}")]
    RouteMismatch { expected: String, found: String },
    #[error("response confidence {0} is outside [0,1]")]
    ConfidenceOutOfRange(f64),
}

/// Extract the outermost `{...}` span; generators often wrap JSON in prose or fences.
fn outermost_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

pub(super) fn parse_response(
    raw: &str,
    decision: &RerouteDecision,
) -> Result<ExplainerResponse, ResponseError> {
    let object = outermost_object(raw).ok_or(ResponseError::NoJsonObject)?;
    let mut response: ExplainerResponse =
        serde_json::from_str(object).map_err(|err| ResponseError::Malformed(err.to_string()))?;

    response.rationale = response.rationale.trim().to_string();
    if response.rationale.is_empty() {
        return Err(ResponseError::EmptyRationale);
    }

    response.factors = response
        .factors
        .into_iter()
        .map(|factor| factor.trim().to_string())
        .filter(|factor| !factor.is_empty())
        .collect();
    if response.factors.is_empty() {
        return Err(ResponseError::NoFactors);
    }

    if let Some(found) = &response.recommended_route {
        if found.trim() != decision.recommended.id.0 {
            return Err(ResponseError::RouteMismatch {
                expected: decision.recommended.id.0.clone(),
                found: found.clone(),
            });
        }
    }

    if !response.confidence.is_finite() || !(0.0..=1.0).contains(&response.confidence) {
        return Err(ResponseError::ConfidenceOutOfRange(response.confidence));
    }

    response.improvements.retain(|_, value| value.is_finite());
    Ok(response)
}
