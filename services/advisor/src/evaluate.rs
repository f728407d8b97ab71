use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use route_advisor::config::PipelineConfig;
use route_advisor::error::AppError;
use route_advisor::workflows::reroute::RerouteAdvisor;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::infra::{fixture_sources, FixtureExplainer, InMemoryRecommendationStore, LoggingAuditSink};
use crate::render::{render_outcome, render_summary};
use crate::scenario::load_scenarios;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON file holding one scenario or an array of scenarios
    #[arg(long)]
    pub(crate) scenario: PathBuf,
    /// Ignore explainer replies supplied by the scenario and use the deterministic template
    #[arg(long)]
    pub(crate) no_explainer: bool,
    /// Print the Prometheus exposition text after the run
    #[arg(long)]
    pub(crate) print_metrics: bool,
}

pub(crate) async fn run_evaluate(
    args: EvaluateArgs,
    config: &PipelineConfig,
) -> Result<(), AppError> {
    let scenarios = load_scenarios(&args.scenario)?;
    println!(
        "Reroute evaluation: {} shipment(s) from {}",
        scenarios.len(),
        args.scenario.display()
    );

    let store = Arc::new(InMemoryRecommendationStore::default());
    let audit = Arc::new(LoggingAuditSink::default());
    let cancel = CancellationToken::new();

    for scenario in &scenarios {
        if !scenario.fixtures.has_providers() {
            info!(
                shipment = %scenario.evaluation.shipment.reference,
                "scenario carries no provider readings; unpredicted routes score on default risk"
            );
        }
        let mut advisor = RerouteAdvisor::from_config(
            store.clone(),
            audit.clone(),
            fixture_sources(&scenario.fixtures),
            config,
        )?;
        if !args.no_explainer {
            if let Some(reply) = scenario.fixtures.explainer_reply.as_deref() {
                advisor = advisor.with_explainer(Arc::new(FixtureExplainer::new(reply)));
            }
        }

        let shipment_ref = &scenario.evaluation.shipment.reference;
        match advisor.evaluate(&scenario.evaluation, &cancel).await {
            Ok(outcome) => render_outcome(shipment_ref, outcome.as_ref()),
            Err(err) => {
                warn!(shipment = %shipment_ref, error = %err, "evaluation rejected");
                println!("\nShipment {shipment_ref}\n- Evaluation rejected: {err}");
            }
        }
    }

    render_summary(&store, &audit);
    Ok(())
}
