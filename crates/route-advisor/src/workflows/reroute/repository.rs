use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApprovalRequest, FallbackReason, Recommendation, RecommendationId};

/// Storage abstraction for emitted recommendations and approval requests.
pub trait RecommendationStore: Send + Sync {
    /// Persist a recommendation together with its approval request, if gated.
    /// Both are stored or neither is.
    fn insert_recommendation(
        &self,
        recommendation: Recommendation,
        approval: Option<ApprovalRequest>,
    ) -> Result<Recommendation, StoreError>;
    fn update_recommendation(&self, recommendation: Recommendation) -> Result<(), StoreError>;
    fn fetch_recommendation(
        &self,
        id: &RecommendationId,
    ) -> Result<Option<Recommendation>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Which explainer produced each rationale, for live-versus-fallback reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleAudit {
    pub recommendation_id: RecommendationId,
    pub subject_ref: String,
    pub model: String,
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    pub confidence: f64,
    pub recorded_at: DateTime<Utc>,
}

impl RationaleAudit {
    pub fn from_recommendation(recommendation: &Recommendation) -> Self {
        Self {
            recommendation_id: recommendation.id.clone(),
            subject_ref: recommendation.subject_ref.clone(),
            model: recommendation.rationale.model.clone(),
            is_fallback: recommendation.rationale.is_fallback(),
            fallback_reason: recommendation.rationale.fallback_reason,
            confidence: recommendation.rationale.confidence,
            recorded_at: Utc::now(),
        }
    }
}

/// Fire-and-forget audit hook. Failures are logged by the caller and never fatal.
pub trait AuditSink: Send + Sync {
    fn record(&self, audit: RationaleAudit) -> Result<(), AuditError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport unavailable: {0}")]
    Transport(String),
}
