use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::approval::{ApprovalGate, ApprovalPolicy, GateResult};
use super::cache::PredictionCache;
use super::domain::{
    ApprovalRequest, ApprovalVerdict, InputError, LifecycleError, Rationale, Recommendation,
    RecommendationId, RecommendationStatus, RecommendationType, RiskBreakdown, RouteCandidate,
    ScoredRoute, ShipmentContext,
};
use super::evaluation::{AlternativeEvaluator, EvalPolicy, EvaluationError, RerouteDecision};
use super::rationale::{GenerativeExplainer, RationaleBuilder};
use super::repository::{AuditSink, RationaleAudit, RecommendationStore, StoreError};
use super::risk::{RiskSignalAggregator, RiskSources};
use super::scoring::{RiskDomainWeights, RouteScorer};
use crate::config::{ConfigError, PipelineConfig};

/// One shipment's current route and the alternatives to compare it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentEvaluation {
    pub shipment: ShipmentContext,
    pub current: RouteCandidate,
    #[serde(default)]
    pub alternatives: Vec<RouteCandidate>,
}

/// Everything emitted for a shipment whose evaluation produced a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub recommendation: Recommendation,
    pub decision: RerouteDecision,
    pub gate: GateResult,
    pub approval_request: Option<ApprovalRequest>,
}

impl EvaluationOutcome {
    /// True when the gate let the change through without sign-off. The
    /// recommendation stays PENDING; applying it is the caller's move.
    pub fn auto_apply(&self) -> bool {
        !self.gate.requires_approval
    }
}

#[derive(Debug)]
pub struct SweepResult {
    pub shipment_ref: String,
    pub result: Result<Option<EvaluationOutcome>, RerouteServiceError>,
}

/// Everything computed before anything is emitted.
struct Analysis {
    decision: RerouteDecision,
    rationale: Rationale,
    gate: GateResult,
}

const INTERNAL_METRICS_SOURCE: &str = "internal_metrics";
const PREDICTION_SOURCE: &str = "risk_prediction";

static RECOMMENDATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_recommendation_id() -> RecommendationId {
    let id = RECOMMENDATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RecommendationId(format!("rec-{id:06}"))
}

fn risk_cache_key(candidate: &RouteCandidate) -> String {
    let signature: Vec<String> = candidate
        .waypoints
        .iter()
        .map(|waypoint| {
            format!(
                "{:.4},{:.4},{},{}",
                waypoint.lat,
                waypoint.lon,
                waypoint.kind.as_deref().unwrap_or(""),
                waypoint.port_code.as_deref().unwrap_or("")
            )
        })
        .collect();
    format!("{}|{}", candidate.id, signature.join(";"))
}

/// Service composing risk aggregation, scoring, evaluation, explanation and gating.
pub struct RerouteAdvisor<S, A> {
    store: Arc<S>,
    audit: Arc<A>,
    sources: RiskSources,
    explainer: Option<Arc<dyn GenerativeExplainer>>,
    aggregator: RiskSignalAggregator,
    scorer: RouteScorer,
    evaluator: AlternativeEvaluator,
    rationale: RationaleBuilder,
    gate: ApprovalGate,
    eval_policy: EvalPolicy,
    approval_policy: ApprovalPolicy,
    risk_cache: PredictionCache<RiskBreakdown>,
    sweep_concurrency: usize,
}

impl<S, A> RerouteAdvisor<S, A>
where
    S: RecommendationStore + 'static,
    A: AuditSink + 'static,
{
    pub fn new(store: Arc<S>, audit: Arc<A>, sources: RiskSources) -> Self {
        Self {
            store,
            audit,
            sources,
            explainer: None,
            aggregator: RiskSignalAggregator::default(),
            scorer: RouteScorer::default(),
            evaluator: AlternativeEvaluator::new(),
            rationale: RationaleBuilder::default(),
            gate: ApprovalGate::new(),
            eval_policy: EvalPolicy::default(),
            approval_policy: ApprovalPolicy::default(),
            risk_cache: PredictionCache::default(),
            sweep_concurrency: PipelineConfig::default().sweep_concurrency,
        }
    }

    pub fn from_config(
        store: Arc<S>,
        audit: Arc<A>,
        sources: RiskSources,
        config: &PipelineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            aggregator: RiskSignalAggregator::new(
                RiskDomainWeights::default(),
                config.provider_timeout,
            ),
            rationale: RationaleBuilder::new(config.explainer_settings()?),
            eval_policy: config.eval_policy()?,
            approval_policy: config.approval_policy()?,
            risk_cache: PredictionCache::new(config.cache_capacity, config.cache_ttl)?,
            sweep_concurrency: config.sweep_concurrency,
            ..Self::new(store, audit, sources)
        })
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn GenerativeExplainer>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    pub fn with_scorer(mut self, scorer: RouteScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_policies(mut self, eval_policy: EvalPolicy, approval_policy: ApprovalPolicy) -> Self {
        self.eval_policy = eval_policy;
        self.approval_policy = approval_policy;
        self
    }

    pub fn risk_cache(&self) -> &PredictionCache<RiskBreakdown> {
        &self.risk_cache
    }

    /// Run the full pipeline for one shipment. Nothing reaches the store unless
    /// every stage finished and `cancel` was not triggered.
    pub async fn evaluate(
        &self,
        request: &ShipmentEvaluation,
        cancel: &CancellationToken,
    ) -> Result<Option<EvaluationOutcome>, RerouteServiceError> {
        let analysis = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(shipment = %request.shipment.reference, "evaluation cancelled");
                return Err(RerouteServiceError::Cancelled);
            }
            analysis = self.analyze(request) => analysis?,
        };

        let Some(analysis) = analysis else {
            return Ok(None);
        };
        if cancel.is_cancelled() {
            return Err(RerouteServiceError::Cancelled);
        }

        self.emit(&request.shipment, analysis).map(Some)
    }

    /// Evaluate many shipments with bounded concurrency. Results arrive in completion order.
    pub async fn sweep(
        &self,
        requests: &[ShipmentEvaluation],
        cancel: &CancellationToken,
    ) -> Vec<SweepResult> {
        info!(shipments = requests.len(), concurrency = self.sweep_concurrency, "sweep started");
        stream::iter(requests)
            .map(|request| async move {
                SweepResult {
                    shipment_ref: request.shipment.reference.clone(),
                    result: self.evaluate(request, cancel).await,
                }
            })
            .buffer_unordered(self.sweep_concurrency)
            .collect()
            .await
    }

    /// Apply an external approval decision to a pending recommendation.
    pub fn record_verdict(
        &self,
        id: &RecommendationId,
        verdict: ApprovalVerdict,
    ) -> Result<Recommendation, RerouteServiceError> {
        self.transition(id, verdict.into())
    }

    /// Mark an approved recommendation as applied by the surrounding system.
    pub fn mark_implemented(
        &self,
        id: &RecommendationId,
    ) -> Result<Recommendation, RerouteServiceError> {
        self.transition(id, RecommendationStatus::Implemented)
    }

    fn transition(
        &self,
        id: &RecommendationId,
        next: RecommendationStatus,
    ) -> Result<Recommendation, RerouteServiceError> {
        let mut recommendation = self
            .store
            .fetch_recommendation(id)?
            .ok_or_else(|| RerouteServiceError::NotFound(id.clone()))?;
        recommendation.transition(next)?;
        self.store.update_recommendation(recommendation.clone())?;
        info!(recommendation = %id, status = next.label(), "recommendation status updated");
        Ok(recommendation)
    }

    async fn analyze(
        &self,
        request: &ShipmentEvaluation,
    ) -> Result<Option<Analysis>, RerouteServiceError> {
        let shipment_ref = request.shipment.reference.trim();
        if shipment_ref.is_empty() {
            return Err(InputError::EmptyShipmentRef.into());
        }
        request.current.validate(shipment_ref)?;
        for alternative in &request.alternatives {
            alternative.validate(shipment_ref)?;
        }

        let current = self.score_route(&request.current, shipment_ref, true).await?;
        let alternatives: Vec<ScoredRoute> = join_all(
            request
                .alternatives
                .iter()
                .map(|candidate| self.score_route(candidate, shipment_ref, false)),
        )
        .await
        .into_iter()
        .collect::<Result<_, _>>()?;

        let Some(decision) =
            self.evaluator
                .evaluate(&current, &alternatives, &self.eval_policy)?
        else {
            info!(shipment = shipment_ref, "no reroute warranted");
            return Ok(None);
        };

        let rationale = self
            .rationale
            .build(&request.shipment, &decision, self.explainer.as_deref())
            .await;
        let gate = self.gate.gate(&decision, &self.approval_policy);

        Ok(Some(Analysis {
            decision,
            rationale,
            gate,
        }))
    }

    async fn score_route(
        &self,
        candidate: &RouteCandidate,
        shipment_ref: &str,
        is_current: bool,
    ) -> Result<ScoredRoute, InputError> {
        let risk = self.route_risk(candidate).await;
        let data_sources = if candidate.predicted_risk.is_some() {
            vec![INTERNAL_METRICS_SOURCE, PREDICTION_SOURCE]
        } else {
            self.sources.data_sources()
        };
        self.scorer
            .score(candidate, shipment_ref, risk, &data_sources, is_current)
    }

    async fn route_risk(&self, candidate: &RouteCandidate) -> RiskBreakdown {
        if let Some(predicted) = candidate.predicted_risk {
            return RiskBreakdown::from_prediction(predicted);
        }

        let key = risk_cache_key(candidate);
        if let Some(cached) = self.risk_cache.get(&key) {
            debug!(route = %candidate.id, "risk breakdown served from cache");
            return cached;
        }

        let breakdown = self
            .aggregator
            .aggregate(&candidate.waypoints, &self.sources)
            .await;
        // Only live readings are cached.
        if !breakdown.is_degraded() {
            self.risk_cache.insert(key, breakdown.clone());
        }
        breakdown
    }

    fn emit(
        &self,
        shipment: &ShipmentContext,
        analysis: Analysis,
    ) -> Result<EvaluationOutcome, RerouteServiceError> {
        let Analysis {
            decision,
            rationale,
            gate,
        } = analysis;

        let recommendation = Recommendation {
            id: next_recommendation_id(),
            kind: RecommendationType::Reroute,
            subject_ref: shipment.reference.trim().to_string(),
            severity: decision.severity,
            confidence: rationale.confidence,
            rationale,
            status: RecommendationStatus::Pending,
            created_at: Utc::now(),
            current_route: decision.current.id.clone(),
            recommended_route: decision.recommended.id.clone(),
        };
        let approval_request = self
            .gate
            .approval_input(&decision, &gate)
            .map(|input| ApprovalRequest {
                policy_triggered: input.policy_triggered,
                required_role: input.required_role,
                related_recommendation_id: recommendation.id.clone(),
                reason: gate.reason.clone(),
                cost_delta_usd: input.cost_delta_usd,
                risk_delta: input.risk_delta,
                requested_at: Utc::now(),
            });
        let recommendation = self
            .store
            .insert_recommendation(recommendation, approval_request.clone())?;

        if let Err(err) = self
            .audit
            .record(RationaleAudit::from_recommendation(&recommendation))
        {
            warn!(recommendation = %recommendation.id, error = %err, "rationale audit dropped");
        }

        let gated = if gate.requires_approval { "true" } else { "false" };
        metrics::counter!("route_advisor_recommendations_total", "gated" => gated).increment(1);
        info!(
            recommendation = %recommendation.id,
            shipment = %recommendation.subject_ref,
            recommended = %recommendation.recommended_route,
            severity = recommendation.severity.label(),
            model = %recommendation.rationale.model,
            gated = gate.requires_approval,
            reason = %gate.reason,
            "reroute recommendation emitted"
        );

        Ok(EvaluationOutcome {
            recommendation,
            decision,
            gate,
            approval_request,
        })
    }
}

/// Error raised by the reroute service.
#[derive(Debug, thiserror::Error)]
pub enum RerouteServiceError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("recommendation {0} not found")]
    NotFound(RecommendationId),
    #[error("evaluation cancelled before completion")]
    Cancelled,
}
