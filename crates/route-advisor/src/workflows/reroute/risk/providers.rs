use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workflows::reroute::domain::Coordinate;

/// Weather exposure along a whole route, each component in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub wind_risk: f64,
    pub wave_risk: f64,
    pub storm_probability: f64,
    pub visibility_risk: f64,
}

impl WeatherReading {
    /// `0.3*wind + 0.3*wave + 0.3*storm + 0.1*visibility`, or `None` if any input is not finite.
    pub fn combined(&self) -> Option<f64> {
        let parts = [
            self.wind_risk,
            self.wave_risk,
            self.storm_probability,
            self.visibility_risk,
        ];
        if parts.iter().any(|value| !value.is_finite()) {
            return None;
        }
        let [wind, wave, storm, visibility] = parts.map(|value| value.clamp(0.0, 1.0));
        Some((0.3 * wind + 0.3 * wave + 0.3 * storm + 0.1 * visibility).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentAssessment {
    pub risk_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortConditions {
    pub congestion_score: f64,
}

/// Failure reported by a risk provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("no data for {0}")]
    NotFound(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn analyze_route(&self, coords: &[Coordinate]) -> Result<WeatherReading, ProviderError>;
}

#[async_trait]
pub trait GeopoliticalProvider: Send + Sync {
    async fn assess_segment(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<SegmentAssessment, ProviderError>;
}

#[async_trait]
pub trait MaritimeProvider: Send + Sync {
    async fn fetch_port_conditions(&self, port_code: &str)
        -> Result<PortConditions, ProviderError>;
}

/// Capability set of independent, individually optional risk providers.
#[derive(Clone, Default)]
pub struct RiskSources {
    pub weather: Option<Arc<dyn WeatherProvider>>,
    pub geopolitical: Option<Arc<dyn GeopoliticalProvider>>,
    pub maritime: Option<Arc<dyn MaritimeProvider>>,
}

impl RiskSources {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_weather(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(provider);
        self
    }

    pub fn with_geopolitical(mut self, provider: Arc<dyn GeopoliticalProvider>) -> Self {
        self.geopolitical = Some(provider);
        self
    }

    pub fn with_maritime(mut self, provider: Arc<dyn MaritimeProvider>) -> Self {
        self.maritime = Some(provider);
        self
    }

    /// Names of the feeds a live-aggregated score draws on, recorded on each `ScoredRoute`.
    pub fn data_sources(&self) -> Vec<&'static str> {
        let mut sources = vec!["internal_metrics"];
        if self.weather.is_some() {
            sources.push("weather_api");
        }
        if self.geopolitical.is_some() {
            sources.push("geopolitical_api");
        }
        if self.maritime.is_some() {
            sources.push("maritime_api");
        }
        sources
    }
}

impl fmt::Debug for RiskSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskSources")
            .field("weather", &self.weather.is_some())
            .field("geopolitical", &self.geopolitical.is_some())
            .field("maritime", &self.maritime.is_some())
            .finish()
    }
}
