use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use route_advisor::workflows::reroute::{
    ApprovalRequest, AuditError, AuditSink, Coordinate, ExplainerError, GenerativeExplainer,
    GeopoliticalProvider, MaritimeProvider, PortConditions, ProviderError, RationaleAudit,
    Recommendation, RecommendationId, RecommendationStore, RiskSources, SegmentAssessment,
    StoreError, WeatherProvider, WeatherReading,
};
use tracing::info;

use crate::scenario::FixtureReadings;

#[derive(Default, Clone)]
pub(crate) struct InMemoryRecommendationStore {
    recommendations: Arc<Mutex<HashMap<RecommendationId, Recommendation>>>,
    approvals: Arc<Mutex<Vec<ApprovalRequest>>>,
}

impl RecommendationStore for InMemoryRecommendationStore {
    fn insert_recommendation(
        &self,
        recommendation: Recommendation,
        approval: Option<ApprovalRequest>,
    ) -> Result<Recommendation, StoreError> {
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
        let mut guard = self.recommendations.lock();
        if guard.contains_key(&recommendation.id) {
            guard.insert(recommendation.id.clone(), recommendation);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn fetch_recommendation(
        &self,
        id: &RecommendationId,
    ) -> Result<Option<Recommendation>, StoreError> {
        Ok(self.recommendations.lock().get(id).cloned())
    }
}

impl InMemoryRecommendationStore {
    pub(crate) fn approvals(&self) -> Vec<ApprovalRequest> {
        self.approvals.lock().clone()
    }

    pub(crate) fn recommendation_count(&self) -> usize {
        self.recommendations.lock().len()
    }
}

/// Writes rationale audits to the log and keeps them for the end-of-run summary.
#[derive(Default, Clone)]
pub(crate) struct LoggingAuditSink {
    records: Arc<Mutex<Vec<RationaleAudit>>>,
}

impl AuditSink for LoggingAuditSink {
    fn record(&self, audit: RationaleAudit) -> Result<(), AuditError> {
        info!(
            recommendation = %audit.recommendation_id,
            shipment = %audit.subject_ref,
            model = %audit.model,
            fallback = audit.is_fallback,
            confidence = audit.confidence,
            "rationale audit recorded"
        );
        self.records.lock().push(audit);
        Ok(())
    }
}

impl LoggingAuditSink {
    pub(crate) fn records(&self) -> Vec<RationaleAudit> {
        self.records.lock().clone()
    }
}

struct FixtureWeather(WeatherReading);

#[async_trait]
impl WeatherProvider for FixtureWeather {
    async fn analyze_route(&self, coords: &[Coordinate]) -> Result<WeatherReading, ProviderError> {
        if coords.is_empty() {
            return Err(ProviderError::InvalidResponse("no coordinates".to_string()));
        }
        Ok(self.0)
    }
}

struct FixtureGeopolitical(f64);

#[async_trait]
impl GeopoliticalProvider for FixtureGeopolitical {
    async fn assess_segment(
        &self,
        _start: Coordinate,
        _end: Coordinate,
    ) -> Result<SegmentAssessment, ProviderError> {
        Ok(SegmentAssessment { risk_score: self.0 })
    }
}

struct FixturePorts(BTreeMap<String, f64>);

#[async_trait]
impl MaritimeProvider for FixturePorts {
    async fn fetch_port_conditions(
        &self,
        port_code: &str,
    ) -> Result<PortConditions, ProviderError> {
        self.0
            .get(port_code)
            .map(|congestion_score| PortConditions {
                congestion_score: *congestion_score,
            })
            .ok_or_else(|| ProviderError::NotFound(port_code.to_string()))
    }
}

/// Replays a canned explainer reply.
pub(crate) struct FixtureExplainer {
    reply: String,
}

impl FixtureExplainer {
    pub(crate) fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl GenerativeExplainer for FixtureExplainer {
    fn model_id(&self) -> &str {
        "fixture-explainer"
    }

    async fn explain(&self, _prompt: &str) -> Result<String, ExplainerError> {
        Ok(self.reply.clone())
    }
}

/// Wire the fixture adapters for whichever readings the scenario carries.
pub(crate) fn fixture_sources(readings: &FixtureReadings) -> RiskSources {
    let mut sources = RiskSources::none();
    if let Some(reading) = readings.weather {
        sources = sources.with_weather(Arc::new(FixtureWeather(reading)));
    }
    if let Some(risk) = readings.segment_risk {
        sources = sources.with_geopolitical(Arc::new(FixtureGeopolitical(risk)));
    }
    if !readings.ports.is_empty() {
        sources = sources.with_maritime(Arc::new(FixturePorts(readings.ports.clone())));
    }
    sources
}
