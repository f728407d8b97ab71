use serde::Serialize;

use crate::config::ConfigError;

/// Allowed drift from an exact 1.0 weight sum.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

fn check_weight(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NegativeWeight { name, value })
    }
}

/// Cross-factor weights for the composite route score. Always sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringWeights {
    cost: f64,
    time: f64,
    risk: f64,
    emissions: f64,
    reliability: f64,
}

impl ScoringWeights {
    pub fn new(
        cost: f64,
        time: f64,
        risk: f64,
        emissions: f64,
        reliability: f64,
    ) -> Result<Self, ConfigError> {
        let weights = Self {
            cost: check_weight("cost", cost)?,
            time: check_weight("time", time)?,
            risk: check_weight("risk", risk)?,
            emissions: check_weight("emissions", emissions)?,
            reliability: check_weight("reliability", reliability)?,
        };

        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::InvalidWeights { sum });
        }
        Ok(weights)
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn risk(&self) -> f64 {
        self.risk
    }

    pub fn emissions(&self) -> f64 {
        self.emissions
    }

    pub fn reliability(&self) -> f64 {
        self.reliability
    }

    pub fn sum(&self) -> f64 {
        self.cost + self.time + self.risk + self.emissions + self.reliability
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            cost: 0.25,
            time: 0.20,
            risk: 0.30,
            emissions: 0.15,
            reliability: 0.10,
        }
    }
}

/// Cross-domain weights used to combine weather, geopolitical, and maritime risk.
///
/// The defaults sum to 0.85. The remaining 0.15 is reserved for a
/// port-congestion class factor and is never spread over the live domains, so
/// combined risk tops out at `assigned()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskDomainWeights {
    weather: f64,
    geopolitical: f64,
    maritime: f64,
}

impl RiskDomainWeights {
    pub fn new(weather: f64, geopolitical: f64, maritime: f64) -> Result<Self, ConfigError> {
        let weights = Self {
            weather: check_weight("weather", weather)?,
            geopolitical: check_weight("geopolitical", geopolitical)?,
            maritime: check_weight("maritime", maritime)?,
        };

        let sum = weights.assigned();
        if sum > 1.0 + WEIGHT_TOLERANCE {
            return Err(ConfigError::InvalidWeights { sum });
        }
        Ok(weights)
    }

    pub fn weather(&self) -> f64 {
        self.weather
    }

    pub fn geopolitical(&self) -> f64 {
        self.geopolitical
    }

    pub fn maritime(&self) -> f64 {
        self.maritime
    }

    /// Weight mass assigned to live domains.
    pub fn assigned(&self) -> f64 {
        self.weather + self.geopolitical + self.maritime
    }

    /// Weight mass held back for future domains.
    pub fn reserved(&self) -> f64 {
        (1.0 - self.assigned()).max(0.0)
    }

    pub fn combine(&self, weather: f64, geopolitical: f64, maritime: f64) -> f64 {
        (self.weather * weather + self.geopolitical * geopolitical + self.maritime * maritime)
            .clamp(0.0, 1.0)
    }
}

impl Default for RiskDomainWeights {
    fn default() -> Self {
        Self {
            weather: 0.35,
            geopolitical: 0.30,
            maritime: 0.20,
        }
    }
}
