use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::workflows::reroute::domain::{
    ApprovalRequest, Coordinate, Recommendation, RecommendationId, RiskBreakdown, RouteCandidate,
    RouteId, RouteMetrics, ScoredRoute, ShipmentContext, SubScores, Waypoint,
};
use crate::workflows::reroute::evaluation::{AlternativeEvaluator, EvalPolicy, RerouteDecision};
use crate::workflows::reroute::rationale::{ExplainerError, GenerativeExplainer};
use crate::workflows::reroute::repository::{
    AuditError, AuditSink, RationaleAudit, RecommendationStore, StoreError,
};
use crate::workflows::reroute::risk::{
    GeopoliticalProvider, MaritimeProvider, PortConditions, ProviderError, SegmentAssessment,
    WeatherProvider, WeatherReading,
};
use crate::workflows::reroute::scoring::RouteScorer;
use crate::workflows::reroute::service::ShipmentEvaluation;

pub(super) const SHIPMENT: &str = "SHP-1001";

pub(super) fn shipment() -> ShipmentContext {
    ShipmentContext {
        reference: SHIPMENT.to_string(),
        origin: Some("Shanghai".to_string()),
        destination: Some("Rotterdam".to_string()),
        carrier: Some("Blue Anchor Lines".to_string()),
        cargo_description: Some("consumer electronics".to_string()),
    }
}

pub(super) fn metrics(cost_usd: f64, duration_hours: f64, emissions_kg: f64) -> RouteMetrics {
    RouteMetrics {
        distance_km: 0.0,
        duration_hours,
        cost_usd,
        emissions_kg,
    }
}

pub(super) fn candidate(id: &str, metrics: RouteMetrics, predicted_risk: Option<f64>) -> RouteCandidate {
    RouteCandidate {
        id: RouteId(id.to_string()),
        name: format!("{id} lane"),
        shipment_ref: Some(SHIPMENT.to_string()),
        metrics,
        waypoints: Vec::new(),
        reliability: None,
        predicted_risk,
    }
}

pub(super) fn waypoint(name: &str, lat: f64, lon: f64) -> Waypoint {
    Waypoint {
        name: name.to_string(),
        lat,
        lon,
        kind: Some("waypoint".to_string()),
        port_code: None,
    }
}

pub(super) fn port(name: &str, lat: f64, lon: f64) -> Waypoint {
    Waypoint {
        kind: Some("port".to_string()),
        ..waypoint(name, lat, lon)
    }
}

/// Shanghai to Rotterdam through Singapore and Suez.
pub(super) fn asia_europe_waypoints() -> Vec<Waypoint> {
    vec![
        port("Port of Shanghai", 31.23, 121.47),
        port("Singapore", 1.26, 103.84),
        waypoint("Bab-el-Mandeb", 12.58, 43.33),
        port("Suez Canal", 29.97, 32.55),
        port("Rotterdam", 51.95, 4.14),
    ]
}

/// Current route of the reference scenario: expensive, slow, and exposed.
pub(super) fn e2e_current() -> RouteCandidate {
    candidate("route-current", metrics(120_000.0, 400.0, 500_000.0), Some(0.82))
}

/// Alternative of the reference scenario: cheaper and much safer but above the auto-cost limit.
pub(super) fn e2e_alternative() -> RouteCandidate {
    candidate("route-cape", metrics(108_000.0, 412.0, 490_000.0), Some(0.57))
}

pub(super) fn e2e_request() -> ShipmentEvaluation {
    ShipmentEvaluation {
        shipment: shipment(),
        current: e2e_current(),
        alternatives: vec![e2e_alternative()],
    }
}

/// Build a scored route directly, bypassing aggregation.
pub(super) fn scored(id: &str, metrics: RouteMetrics, combined_risk: f64, is_current: bool) -> ScoredRoute {
    RouteScorer::default()
        .score(
            &candidate(id, metrics, None),
            SHIPMENT,
            RiskBreakdown::from_prediction(combined_risk),
            &["internal_metrics"],
            is_current,
        )
        .expect("fixture route is valid")
}

/// Scored route with a fixed composite, for tie-break tests.
pub(super) fn with_composite(
    id: &str,
    composite_score: f64,
    cost_usd: f64,
    duration_hours: f64,
    is_current: bool,
) -> ScoredRoute {
    ScoredRoute {
        id: RouteId(id.to_string()),
        name: id.to_string(),
        shipment_ref: SHIPMENT.to_string(),
        metrics: metrics(cost_usd, duration_hours, 0.0),
        risk: RiskBreakdown::from_prediction(0.3),
        sub_scores: SubScores {
            cost: 0.5,
            time: 0.5,
            risk: 0.7,
            emissions: 1.0,
            reliability: 0.8,
        },
        composite_score,
        is_current,
        scored_at: Utc::now(),
        data_sources: vec!["internal_metrics".to_string()],
    }
}

pub(super) fn e2e_decision() -> RerouteDecision {
    let current = scored("route-current", metrics(120_000.0, 400.0, 500_000.0), 0.82, true);
    let alternative = scored("route-cape", metrics(108_000.0, 412.0, 490_000.0), 0.57, false);
    AlternativeEvaluator::new()
        .evaluate(&current, &[alternative], &EvalPolicy::default())
        .expect("valid input")
        .expect("alternative qualifies")
}

#[derive(Default)]
pub(super) struct MemoryStore {
    pub recommendations: Mutex<BTreeMap<RecommendationId, Recommendation>>,
    pub approvals: Mutex<Vec<ApprovalRequest>>,
    pub unavailable: bool,
    pub rejects_approvals: bool,
}

impl MemoryStore {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Accepts ungated recommendations but fails any write that carries an approval request.
    pub fn rejecting_approvals() -> Self {
        Self {
            rejects_approvals: true,
            ..Self::default()
        }
    }

    pub fn recommendation_count(&self) -> usize {
        self.recommendations.lock().len()
    }

    pub fn approval_count(&self) -> usize {
        self.approvals.lock().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable("maintenance window".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RecommendationStore for MemoryStore {
    fn insert_recommendation(
        &self,
        recommendation: Recommendation,
        approval: Option<ApprovalRequest>,
    ) -> Result<Recommendation, StoreError> {
        self.check()?;
        if self.rejects_approvals && approval.is_some() {
            return Err(StoreError::Unavailable("approval queue offline".to_string()));
        }
        let mut guard = self.recommendations.lock();
        if guard.contains_key(&recommendation.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(recommendation.id.clone(), recommendation.clone());
        if let Some(request) = approval {
            self.approvals.lock().push(request);
        }
        Ok(recommendation)
    }

    fn update_recommendation(&self, recommendation: Recommendation) -> Result<(), StoreError> {
        self.check()?;
        let mut guard = self.recommendations.lock();
        match guard.get_mut(&recommendation.id) {
            Some(existing) => {
                *existing = recommendation;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn fetch_recommendation(
        &self,
        id: &RecommendationId,
    ) -> Result<Option<Recommendation>, StoreError> {
        self.check()?;
        Ok(self.recommendations.lock().get(id).cloned())
    }
}

#[derive(Default)]
pub(super) struct RecordingAudit {
    pub records: Mutex<Vec<RationaleAudit>>,
    pub failing: bool,
}

impl RecordingAudit {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }
}

impl AuditSink for RecordingAudit {
    fn record(&self, audit: RationaleAudit) -> Result<(), AuditError> {
        if self.failing {
            return Err(AuditError::Transport("sink offline".to_string()));
        }
        self.records.lock().push(audit);
        Ok(())
    }
}

pub(super) fn memory_backends() -> (Arc<MemoryStore>, Arc<RecordingAudit>) {
    (
        Arc::new(MemoryStore::default()),
        Arc::new(RecordingAudit::default()),
    )
}

/// Weather provider returning a fixed result after an optional delay.
pub(super) struct ScriptedWeather {
    pub reply: Result<WeatherReading, ProviderError>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl ScriptedWeather {
    pub fn reading(wind: f64, wave: f64, storm: f64, visibility: f64) -> Self {
        Self {
            reply: Ok(WeatherReading {
                wind_risk: wind,
                wave_risk: wave,
                storm_probability: storm,
                visibility_risk: visibility,
            }),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(ProviderError::Unavailable("weather feed down".to_string())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for ScriptedWeather {
    async fn analyze_route(&self, _coords: &[Coordinate]) -> Result<WeatherReading, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}

/// Geopolitical provider scoring each segment by its starting latitude.
pub(super) struct SegmentTable {
    pub by_start_lat: Vec<(f64, Result<f64, ProviderError>)>,
}

#[async_trait]
impl GeopoliticalProvider for SegmentTable {
    async fn assess_segment(
        &self,
        start: Coordinate,
        _end: Coordinate,
    ) -> Result<SegmentAssessment, ProviderError> {
        self.by_start_lat
            .iter()
            .find(|(lat, _)| (lat - start.lat).abs() < 1e-9)
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Ok(0.0))
            .map(|risk_score| SegmentAssessment { risk_score })
    }
}

/// Maritime provider backed by a port-code table; unknown codes are not found.
#[derive(Default)]
pub(super) struct PortTable {
    pub congestion: HashMap<String, f64>,
    pub requested: Mutex<Vec<String>>,
}

impl PortTable {
    pub fn with(entries: &[(&str, f64)]) -> Self {
        Self {
            congestion: entries
                .iter()
                .map(|(code, score)| (code.to_string(), *score))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MaritimeProvider for PortTable {
    async fn fetch_port_conditions(&self, port_code: &str) -> Result<PortConditions, ProviderError> {
        self.requested.lock().push(port_code.to_string());
        self.congestion
            .get(port_code)
            .map(|score| PortConditions {
                congestion_score: *score,
            })
            .ok_or_else(|| ProviderError::NotFound(port_code.to_string()))
    }
}

/// Explainer replying with canned text after an optional delay.
pub(super) struct ScriptedExplainer {
    pub model: String,
    pub reply: Result<String, ExplainerError>,
    pub delay: Option<Duration>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedExplainer {
    pub fn replying(reply: &str) -> Self {
        Self {
            model: "granite-3-8b-instruct".to_string(),
            reply: Ok(reply.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: ExplainerError) -> Self {
        Self {
            reply: Err(err),
            ..Self::replying("")
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn named(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl GenerativeExplainer for ScriptedExplainer {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn explain(&self, prompt: &str) -> Result<String, ExplainerError> {
        self.prompts.lock().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}

/// A well-formed reply for the reference scenario, wrapped in prose.
pub(super) fn generated_reply(route: &str) -> String {
    format!(
        "Here is my assessment:\n```json\n{{\"rationale\": \"The Cape routing avoids the Red Sea exposure while cutting freight cost.\", \
\"factors\": [\"risk drops from 0.82 to 0.57\", \"cost falls by $12000\"], \
\"recommended_route\": \"{route}\", \"improvements\": {{\"risk_reduction\": 0.99, \"port_calls_avoided\": 2}}, \
\"confidence\": 0.83}}\n```\nLet me know if you need more."
    )
}
