use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Args;
use route_advisor::config::PipelineConfig;
use route_advisor::error::AppError;
use route_advisor::workflows::reroute::{
    ApprovalVerdict, RerouteAdvisor, RouteCandidate, RouteId, RouteMetrics, ShipmentContext,
    ShipmentEvaluation, Waypoint, WeatherReading,
};
use tokio_util::sync::CancellationToken;

use crate::infra::{fixture_sources, InMemoryRecommendationStore, LoggingAuditSink};
use crate::render::{render_outcome, render_summary};
use crate::scenario::FixtureReadings;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Leave the gated recommendation pending instead of approving and applying it
    #[arg(long)]
    pub(crate) skip_approval: bool,
    /// Print the Prometheus exposition text after the run
    #[arg(long)]
    pub(crate) print_metrics: bool,
}

pub(crate) async fn run_demo(args: DemoArgs, config: &PipelineConfig) -> Result<(), AppError> {
    println!("Reroute advisory demo");

    let store = Arc::new(InMemoryRecommendationStore::default());
    let audit = Arc::new(LoggingAuditSink::default());
    let advisor = RerouteAdvisor::from_config(
        store.clone(),
        audit.clone(),
        fixture_sources(&demo_readings()),
        config,
    )?;

    let shipments = vec![suez_diversion(), unchanged_lane()];
    let mut results = advisor.sweep(&shipments, &CancellationToken::new()).await;
    results.sort_by(|left, right| left.shipment_ref.cmp(&right.shipment_ref));

    let mut gated = Vec::new();
    for sweep in results {
        let outcome = sweep.result?;
        render_outcome(&sweep.shipment_ref, outcome.as_ref());
        if let Some(outcome) = outcome.filter(|outcome| !outcome.auto_apply()) {
            gated.push(outcome.recommendation.id);
        }
    }

    if !args.skip_approval {
        for id in &gated {
            let approved = advisor.record_verdict(id, ApprovalVerdict::Approved)?;
            println!("\n{} {} by external sign-off", approved.id, approved.status.label());
            let applied = advisor.mark_implemented(id)?;
            println!("{} {}", applied.id, applied.status.label());
        }
    }

    render_summary(&store, &audit);
    Ok(())
}

fn demo_readings() -> FixtureReadings {
    FixtureReadings {
        weather: Some(WeatherReading {
            wind_risk: 0.35,
            wave_risk: 0.3,
            storm_probability: 0.2,
            visibility_risk: 0.1,
        }),
        segment_risk: Some(0.25),
        ports: BTreeMap::from([
            ("CNSHA".to_string(), 0.45),
            ("SGSIN".to_string(), 0.55),
            ("NLRTM".to_string(), 0.3),
        ]),
        explainer_reply: None,
    }
}

fn route(id: &str, name: &str, cost_usd: f64, duration_hours: f64, emissions_kg: f64) -> RouteCandidate {
    RouteCandidate {
        id: RouteId(id.to_string()),
        name: name.to_string(),
        shipment_ref: None,
        metrics: RouteMetrics {
            distance_km: 0.0,
            duration_hours,
            cost_usd,
            emissions_kg,
        },
        waypoints: Vec::new(),
        reliability: None,
        predicted_risk: None,
    }
}

fn port(name: &str, code: &str, lat: f64, lon: f64) -> Waypoint {
    Waypoint {
        name: name.to_string(),
        lat,
        lon,
        kind: Some("port".to_string()),
        port_code: Some(code.to_string()),
    }
}

fn shipment(reference: &str, origin: &str, destination: &str) -> ShipmentContext {
    ShipmentContext {
        reference: reference.to_string(),
        origin: Some(origin.to_string()),
        destination: Some(destination.to_string()),
        carrier: None,
        cargo_description: None,
    }
}

/// Red Sea disruption: the predictor flags the Suez lane and the Cape diversion is cheaper overall.
fn suez_diversion() -> ShipmentEvaluation {
    let mut current = route("suez-direct", "Suez direct", 120_000.0, 400.0, 500_000.0);
    current.predicted_risk = Some(0.82);
    let mut cape = route("cape-of-good-hope", "Cape of Good Hope", 108_000.0, 412.0, 490_000.0);
    cape.predicted_risk = Some(0.57);

    ShipmentEvaluation {
        shipment: shipment("SHP-7731", "Shanghai", "Rotterdam"),
        current,
        alternatives: vec![cape],
    }
}

/// Two identical lanes scored from live fixture readings. Nothing clears the significance gate.
fn unchanged_lane() -> ShipmentEvaluation {
    let waypoints = vec![
        port("Shanghai", "CNSHA", 31.23, 121.47),
        port("Singapore", "SGSIN", 1.26, 103.84),
        port("Rotterdam", "NLRTM", 51.95, 4.14),
    ];
    let mut current = route("malacca-primary", "Malacca primary", 95_000.0, 420.0, 30_000.0);
    current.waypoints = waypoints.clone();
    let mut mirror = route("malacca-mirror", "Malacca mirror", 95_000.0, 420.0, 30_000.0);
    mirror.waypoints = waypoints;

    ShipmentEvaluation {
        shipment: shipment("SHP-7732", "Shanghai", "Rotterdam"),
        current,
        alternatives: vec![mirror],
    }
}
