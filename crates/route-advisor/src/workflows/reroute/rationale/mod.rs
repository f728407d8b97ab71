//! Explanations for reroute decisions.
//!
//! A live generative explainer is tried first when one is configured. Any
//! failure falls through to a deterministic template, so `build` always
//! returns a usable [`Rationale`].

mod prompt;
mod template;

pub use prompt::{ExplainerResponse, ResponseError};
pub use template::FALLBACK_CONFIDENCE;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::domain::{FallbackReason, Rationale, ShipmentContext, FALLBACK_MODEL};
use super::evaluation::RerouteDecision;
use crate::config::ConfigError;

pub const DEFAULT_EXPLAINER_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExplainerError {
    #[error("explainer unavailable: {0}")]
    Unavailable(String),
    #[error("explainer failed: {0}")]
    Failed(String),
}

/// Optional text generator consulted for rationales.
#[async_trait]
pub trait GenerativeExplainer: Send + Sync {
    /// Identifier recorded in `Rationale::model` for generated explanations.
    fn model_id(&self) -> &str;

    async fn explain(&self, prompt: &str) -> Result<String, ExplainerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplainerSettings {
    enabled: bool,
    timeout: Duration,
}

impl Default for ExplainerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: DEFAULT_EXPLAINER_TIMEOUT,
        }
    }
}

impl ExplainerSettings {
    pub fn new(enabled: bool, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidThreshold {
                name: "explainer_timeout",
                value: 0.0,
            });
        }
        Ok(Self { enabled, timeout })
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn record_explainer_degradation(reason: FallbackReason, detail: &str) {
    warn!(
        reason = reason.label(),
        detail, "explainer degraded; using deterministic rationale"
    );
    metrics::counter!(
        "route_advisor_upstream_degraded_total",
        "component" => "explainer",
        "reason" => reason.label()
    )
    .increment(1);
}

#[derive(Debug, Clone, Default)]
pub struct RationaleBuilder {
    settings: ExplainerSettings,
}

impl RationaleBuilder {
    pub fn new(settings: ExplainerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExplainerSettings {
        &self.settings
    }

    /// Never fails. Degradation shows up in `model` and `fallback_reason`.
    pub async fn build(
        &self,
        shipment: &ShipmentContext,
        decision: &RerouteDecision,
        explainer: Option<&dyn GenerativeExplainer>,
    ) -> Rationale {
        let rationale = match self.generate(shipment, decision, explainer).await {
            Ok(rationale) => rationale,
            Err(reason) => template::fallback_rationale(shipment, decision, reason),
        };

        let model_kind = if rationale.is_fallback() {
            "fallback"
        } else {
            "live"
        };
        metrics::counter!("route_advisor_rationale_total", "model_kind" => model_kind)
            .increment(1);
        rationale
    }

    async fn generate(
        &self,
        shipment: &ShipmentContext,
        decision: &RerouteDecision,
        explainer: Option<&dyn GenerativeExplainer>,
    ) -> Result<Rationale, FallbackReason> {
        if !self.settings.enabled {
            debug!("explainer disabled by configuration");
            return Err(FallbackReason::Disabled);
        }
        let Some(explainer) = explainer else {
            debug!("no explainer configured");
            return Err(FallbackReason::Unavailable);
        };

        let model = explainer.model_id().trim();
        if model.is_empty() || model == FALLBACK_MODEL {
            record_explainer_degradation(
                FallbackReason::Failed,
                &format!("explainer reports unusable model id '{model}'"),
            );
            return Err(FallbackReason::Failed);
        }
        let model = model.to_string();

        let prompt = prompt::build_prompt(shipment, decision).map_err(|err| {
            record_explainer_degradation(FallbackReason::Failed, &err.to_string());
            FallbackReason::Failed
        })?;

        let raw = match tokio::time::timeout(self.settings.timeout, explainer.explain(&prompt))
            .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                let reason = match err {
                    ExplainerError::Unavailable(_) => FallbackReason::Unavailable,
                    ExplainerError::Failed(_) => FallbackReason::Failed,
                };
                record_explainer_degradation(reason, &err.to_string());
                return Err(reason);
            }
            Err(_) => {
                record_explainer_degradation(FallbackReason::TimedOut, "deadline elapsed");
                return Err(FallbackReason::TimedOut);
            }
        };

        let response = prompt::parse_response(&raw, decision).map_err(|err| {
            record_explainer_degradation(FallbackReason::Unparseable, &err.to_string());
            FallbackReason::Unparseable
        })?;

        let mut improvements = template::baseline_improvements(decision);
        for (metric, value) in response.improvements {
            improvements.entry(metric).or_insert(value);
        }

        Ok(Rationale {
            text: response.rationale,
            factors: response.factors,
            model,
            improvements,
            confidence: response.confidence,
            fallback_reason: None,
        })
    }
}
