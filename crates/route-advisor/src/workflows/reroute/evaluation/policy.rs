use serde::Serialize;

use crate::config::ConfigError;

pub const DEFAULT_MIN_SCORE_DELTA: f64 = 0.03;
pub const DEFAULT_HIGH_RISK_THRESHOLD: f64 = 0.7;
pub const DEFAULT_MATERIAL_RISK_REDUCTION: f64 = 0.2;

fn check_fraction(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

/// Thresholds that decide whether an alternative is worth recommending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvalPolicy {
    min_score_delta: f64,
    high_risk_threshold: f64,
    material_risk_reduction: f64,
}

impl Default for EvalPolicy {
    fn default() -> Self {
        Self {
            min_score_delta: DEFAULT_MIN_SCORE_DELTA,
            high_risk_threshold: DEFAULT_HIGH_RISK_THRESHOLD,
            material_risk_reduction: DEFAULT_MATERIAL_RISK_REDUCTION,
        }
    }
}

impl EvalPolicy {
    pub fn new(min_score_delta: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            min_score_delta: check_fraction("min_score_delta", min_score_delta)?,
            ..Self::default()
        })
    }

    pub fn with_high_risk_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        self.high_risk_threshold = check_fraction("high_risk_threshold", threshold)?;
        Ok(self)
    }

    pub fn with_material_risk_reduction(mut self, reduction: f64) -> Result<Self, ConfigError> {
        self.material_risk_reduction = check_fraction("material_risk_reduction", reduction)?;
        Ok(self)
    }

    /// Smallest composite improvement that counts as significant.
    pub fn min_score_delta(&self) -> f64 {
        self.min_score_delta
    }

    /// Current-route combined risk at or above which a reroute is HIGH severity.
    pub fn high_risk_threshold(&self) -> f64 {
        self.high_risk_threshold
    }

    /// Risk reduction at or above which a reroute is HIGH severity.
    pub fn material_risk_reduction(&self) -> f64 {
        self.material_risk_reduction
    }
}
