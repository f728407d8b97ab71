use std::collections::BTreeMap;
use std::path::Path;

use route_advisor::error::AppError;
use route_advisor::workflows::reroute::{ShipmentEvaluation, WeatherReading};
use serde::Deserialize;

/// One shipment to evaluate plus the canned provider data that stands in for live feeds.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Scenario {
    #[serde(flatten)]
    pub(crate) evaluation: ShipmentEvaluation,
    #[serde(default)]
    pub(crate) fixtures: FixtureReadings,
}

/// Provider readings replayed by the fixture adapters. Anything left out is
/// treated as an absent provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FixtureReadings {
    #[serde(default)]
    pub(crate) weather: Option<WeatherReading>,
    /// Risk reported for every route segment.
    #[serde(default)]
    pub(crate) segment_risk: Option<f64>,
    /// Congestion score keyed by port code.
    #[serde(default)]
    pub(crate) ports: BTreeMap<String, f64>,
    /// Raw text returned by the explainer, JSON or otherwise.
    #[serde(default)]
    pub(crate) explainer_reply: Option<String>,
}

impl FixtureReadings {
    pub(crate) fn has_providers(&self) -> bool {
        self.weather.is_some() || self.segment_risk.is_some() || !self.ports.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScenarioFile {
    Many(Vec<Scenario>),
    One(Box<Scenario>),
}

pub(crate) fn parse_scenarios(raw: &str) -> Result<Vec<Scenario>, AppError> {
    let parsed: ScenarioFile = serde_json::from_str(raw)?;
    Ok(match parsed {
        ScenarioFile::Many(scenarios) => scenarios,
        ScenarioFile::One(scenario) => vec![*scenario],
    })
}

pub(crate) fn load_scenarios(path: &Path) -> Result<Vec<Scenario>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    parse_scenarios(&raw)
}
