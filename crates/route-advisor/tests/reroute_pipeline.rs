use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use route_advisor::config::PipelineConfig;
use route_advisor::workflows::reroute::{
    ApprovalRequest, ApprovalVerdict, AuditError, AuditSink, RationaleAudit, Recommendation,
    RecommendationId, RecommendationStatus, RecommendationStore, RerouteAdvisor, RiskSources,
    Severity, ShipmentEvaluation, StoreError, FALLBACK_MODEL,
};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Store {
    recommendations: Mutex<BTreeMap<RecommendationId, Recommendation>>,
    approvals: Mutex<Vec<ApprovalRequest>>,
}

impl RecommendationStore for Store {
    fn insert_recommendation(
        &self,
        recommendation: Recommendation,
        approval: Option<ApprovalRequest>,
    ) -> Result<Recommendation, StoreError> {
        self.recommendations
            .lock()
            .expect("store lock")
            .insert(recommendation.id.clone(), recommendation.clone());
        if let Some(request) = approval {
            self.approvals.lock().expect("store lock").push(request);
        }
        Ok(recommendation)
    }

    fn update_recommendation(&self, recommendation: Recommendation) -> Result<(), StoreError> {
        self.recommendations
            .lock()
            .expect("store lock")
            .insert(recommendation.id.clone(), recommendation);
        Ok(())
    }

    fn fetch_recommendation(
        &self,
        id: &RecommendationId,
    ) -> Result<Option<Recommendation>, StoreError> {
        Ok(self.recommendations.lock().expect("store lock").get(id).cloned())
    }
}

#[derive(Default)]
struct Audit {
    records: Mutex<Vec<RationaleAudit>>,
}

impl AuditSink for Audit {
    fn record(&self, audit: RationaleAudit) -> Result<(), AuditError> {
        self.records.lock().expect("audit lock").push(audit);
        Ok(())
    }
}

fn scenario(json: &str) -> ShipmentEvaluation {
    serde_json::from_str(json).expect("scenario parses")
}

const SUEZ_DIVERSION: &str = r#"{
    "shipment": {"reference": "SHP-7731", "origin": "Shanghai", "destination": "Rotterdam"},
    "current": {
        "id": "suez-direct",
        "name": "Suez direct",
        "metrics": {"cost_usd": 120000, "duration_hours": 400, "emissions_kg": 500000},
        "predicted_risk": 0.82
    },
    "alternatives": [
        {
            "id": "cape-of-good-hope",
            "name": "Cape of Good Hope",
            "metrics": {"cost_usd": 108000, "duration_hours": 412, "emissions_kg": 490000},
            "predicted_risk": 0.57
        }
    ]
}"#;

#[tokio::test]
async fn suez_diversion_is_recommended_and_held_for_approval() {
    let store = Arc::new(Store::default());
    let audit = Arc::new(Audit::default());
    let advisor = RerouteAdvisor::from_config(
        store.clone(),
        audit.clone(),
        RiskSources::none(),
        &PipelineConfig::default(),
    )
    .expect("default config is valid");

    let outcome = advisor
        .evaluate(&scenario(SUEZ_DIVERSION), &CancellationToken::new())
        .await
        .expect("pipeline succeeds")
        .expect("reroute recommended");

    assert_eq!(outcome.recommendation.severity, Severity::High);
    assert_eq!(outcome.recommendation.recommended_route.0, "cape-of-good-hope");
    assert!(outcome.gate.requires_approval);
    assert_eq!(outcome.gate.reason, "cost exceeds threshold");
    assert_eq!(outcome.recommendation.rationale.model, FALLBACK_MODEL);
    assert_eq!(store.approvals.lock().expect("lock").len(), 1);
    assert_eq!(audit.records.lock().expect("lock").len(), 1);

    let approved = advisor
        .record_verdict(&outcome.recommendation.id, ApprovalVerdict::Approved)
        .expect("approve");
    assert_eq!(approved.status, RecommendationStatus::Approved);
}

#[tokio::test]
async fn missing_metrics_default_to_zero_instead_of_failing() {
    let store = Arc::new(Store::default());
    let audit = Arc::new(Audit::default());
    let advisor = RerouteAdvisor::new(store, audit, RiskSources::none());

    let request = scenario(
        r#"{
            "shipment": {"reference": "SHP-8812"},
            "current": {"id": "lane-a", "metrics": {"cost_usd": 40000}},
            "alternatives": [{"id": "lane-b", "metrics": {"cost_usd": 40000}}]
        }"#,
    );

    let outcome = advisor
        .evaluate(&request, &CancellationToken::new())
        .await
        .expect("missing metrics are not an error");

    assert!(outcome.is_none());
}
