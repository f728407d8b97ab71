//! Multi-source risk aggregation for a route's waypoints.
//!
//! Each domain is resolved independently. A provider that is absent, fails,
//! times out, or reports garbage contributes its domain default instead, so
//! aggregation itself never fails.

mod ports;
mod providers;

pub use providers::{
    GeopoliticalProvider, MaritimeProvider, PortConditions, ProviderError, RiskSources,
    SegmentAssessment, WeatherProvider, WeatherReading,
};

use std::future::Future;
use std::time::Duration;

use futures::future::{join_all, try_join_all};
use tracing::{debug, warn};

use super::domain::{Coordinate, RiskBreakdown, RiskDomain, Waypoint};
use super::scoring::RiskDomainWeights;

pub const WEATHER_DEFAULT: f64 = 0.3;
pub const GEOPOLITICAL_DEFAULT: f64 = 0.2;
pub const MARITIME_DEFAULT: f64 = 0.2;
/// Maritime risk for a route that touches no ports.
pub const NO_PORTS_RISK: f64 = 0.1;
/// Congestion assumed for a port whose conditions could not be fetched.
pub const PORT_DEFAULT: f64 = 0.3;
/// Floor for the worst-segment geopolitical maximum.
pub const GEOPOLITICAL_BASELINE: f64 = 0.1;

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a domain value came from a default rather than provider data.
#[derive(Debug, Clone, PartialEq)]
pub enum Degradation {
    TimedOut,
    Provider(ProviderError),
    InvalidValue,
    UnknownPort,
}

impl Degradation {
    pub const fn label(&self) -> &'static str {
        match self {
            Degradation::TimedOut => "timeout",
            Degradation::Provider(_) => "provider_error",
            Degradation::InvalidValue => "invalid_value",
            Degradation::UnknownPort => "unknown_port",
        }
    }
}

fn record_degradation(domain: RiskDomain, reason: &Degradation, default: f64) {
    warn!(
        domain = domain.label(),
        reason = reason.label(),
        detail = ?reason,
        default,
        "risk provider degraded; substituting default"
    );
    metrics::counter!(
        "route_advisor_upstream_degraded_total",
        "component" => domain.label(),
        "reason" => reason.label()
    )
    .increment(1);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DomainSignal {
    value: f64,
    degraded: bool,
}

impl DomainSignal {
    fn live(value: f64) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            degraded: false,
        }
    }

    /// Default used because no data could be requested at all.
    fn absent(value: f64) -> Self {
        Self {
            value,
            degraded: true,
        }
    }

    fn failed(domain: RiskDomain, value: f64, reason: Degradation) -> Self {
        record_degradation(domain, &reason, value);
        Self::absent(value)
    }
}

fn finite_score(value: f64) -> Option<f64> {
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

/// Combines weather, geopolitical and maritime signals into a [`RiskBreakdown`].
#[derive(Debug, Clone)]
pub struct RiskSignalAggregator {
    weights: RiskDomainWeights,
    timeout: Duration,
}

impl Default for RiskSignalAggregator {
    fn default() -> Self {
        Self::new(RiskDomainWeights::default(), DEFAULT_PROVIDER_TIMEOUT)
    }
}

impl RiskSignalAggregator {
    pub fn new(weights: RiskDomainWeights, timeout: Duration) -> Self {
        Self { weights, timeout }
    }

    pub fn weights(&self) -> &RiskDomainWeights {
        &self.weights
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn aggregate(&self, waypoints: &[Waypoint], sources: &RiskSources) -> RiskBreakdown {
        let (weather, geopolitical, maritime) = tokio::join!(
            self.weather_risk(waypoints, sources.weather.as_deref()),
            self.geopolitical_risk(waypoints, sources.geopolitical.as_deref()),
            self.maritime_risk(waypoints, sources.maritime.as_deref()),
        );

        let degraded = [
            (RiskDomain::Weather, weather),
            (RiskDomain::Geopolitical, geopolitical),
            (RiskDomain::Maritime, maritime),
        ]
        .into_iter()
        .filter(|(_, signal)| signal.degraded)
        .map(|(domain, _)| domain)
        .collect();

        RiskBreakdown {
            weather: weather.value,
            geopolitical: geopolitical.value,
            maritime: maritime.value,
            combined: self
                .weights
                .combine(weather.value, geopolitical.value, maritime.value),
            degraded,
        }
    }

    async fn call<T, F>(&self, request: F) -> Result<T, Degradation>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(Degradation::Provider(err)),
            Err(_) => Err(Degradation::TimedOut),
        }
    }

    async fn weather_risk(
        &self,
        waypoints: &[Waypoint],
        provider: Option<&dyn WeatherProvider>,
    ) -> DomainSignal {
        let Some(provider) = provider else {
            debug!("no weather provider configured");
            return DomainSignal::absent(WEATHER_DEFAULT);
        };
        if waypoints.is_empty() {
            return DomainSignal::absent(WEATHER_DEFAULT);
        }

        let coords: Vec<Coordinate> = waypoints.iter().map(Waypoint::coordinate).collect();
        match self.call(provider.analyze_route(&coords)).await {
            Ok(reading) => match reading.combined() {
                Some(value) => DomainSignal::live(value),
                None => DomainSignal::failed(
                    RiskDomain::Weather,
                    WEATHER_DEFAULT,
                    Degradation::InvalidValue,
                ),
            },
            Err(reason) => DomainSignal::failed(RiskDomain::Weather, WEATHER_DEFAULT, reason),
        }
    }

    /// Worst segment dominates: one dangerous chokepoint taints the whole route.
    async fn geopolitical_risk(
        &self,
        waypoints: &[Waypoint],
        provider: Option<&dyn GeopoliticalProvider>,
    ) -> DomainSignal {
        let Some(provider) = provider else {
            debug!("no geopolitical provider configured");
            return DomainSignal::absent(GEOPOLITICAL_DEFAULT);
        };
        if waypoints.is_empty() {
            return DomainSignal::absent(GEOPOLITICAL_DEFAULT);
        }

        let segments = waypoints
            .windows(2)
            .map(|pair| provider.assess_segment(pair[0].coordinate(), pair[1].coordinate()));

        match self.call(try_join_all(segments)).await {
            Ok(assessments) => {
                let mut worst = GEOPOLITICAL_BASELINE;
                for assessment in assessments {
                    let Some(score) = finite_score(assessment.risk_score) else {
                        return DomainSignal::failed(
                            RiskDomain::Geopolitical,
                            GEOPOLITICAL_DEFAULT,
                            Degradation::InvalidValue,
                        );
                    };
                    worst = worst.max(score);
                }
                DomainSignal::live(worst)
            }
            Err(reason) => {
                DomainSignal::failed(RiskDomain::Geopolitical, GEOPOLITICAL_DEFAULT, reason)
            }
        }
    }

    async fn maritime_risk(
        &self,
        waypoints: &[Waypoint],
        provider: Option<&dyn MaritimeProvider>,
    ) -> DomainSignal {
        let Some(provider) = provider else {
            debug!("no maritime provider configured");
            return DomainSignal::absent(MARITIME_DEFAULT);
        };
        if waypoints.is_empty() {
            return DomainSignal::absent(MARITIME_DEFAULT);
        }

        let port_calls: Vec<&Waypoint> = waypoints.iter().filter(|wp| wp.is_port()).collect();
        if port_calls.is_empty() {
            return DomainSignal::live(NO_PORTS_RISK);
        }

        let lookups = port_calls.iter().map(|waypoint| async move {
            let Some(code) = ports::resolve_port_code(waypoint) else {
                return Err(Degradation::UnknownPort);
            };
            let conditions = self.call(provider.fetch_port_conditions(&code)).await?;
            finite_score(conditions.congestion_score).ok_or(Degradation::InvalidValue)
        });

        let mut total = 0.0;
        let mut degraded = false;
        for (waypoint, result) in port_calls.iter().zip(join_all(lookups).await) {
            match result {
                Ok(score) => total += score,
                Err(reason) => {
                    debug!(port = %waypoint.name, "port conditions unavailable");
                    record_degradation(RiskDomain::Maritime, &reason, PORT_DEFAULT);
                    degraded = true;
                    total += PORT_DEFAULT;
                }
            }
        }

        DomainSignal {
            value: (total / port_calls.len() as f64).clamp(0.0, 1.0),
            degraded,
        }
    }
}
