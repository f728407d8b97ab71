use crate::demo::{run_demo, DemoArgs};
use crate::evaluate::{run_evaluate, EvaluateArgs};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use route_advisor::config::AppConfig;
use route_advisor::error::AppError;
use route_advisor::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Route Advisor",
    about = "Score alternative routes for in-transit shipments and emit reroute recommendations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate shipments described in a scenario file
    Evaluate(EvaluateArgs),
    /// Run the built-in Suez diversion walkthrough (default command)
    Demo(DemoArgs),
}

impl Command {
    fn print_metrics(&self) -> bool {
        match self {
            Command::Evaluate(args) => args.print_metrics,
            Command::Demo(args) => args.print_metrics,
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Demo(DemoArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(environment = ?config.environment, "route advisor starting");

    let metrics = if command.print_metrics() {
        Some(install_metrics_recorder()?)
    } else {
        None
    };

    match command {
        Command::Evaluate(args) => run_evaluate(args, &config.pipeline).await?,
        Command::Demo(args) => run_demo(args, &config.pipeline).await?,
    }

    if let Some(handle) = metrics {
        println!("\nMetrics snapshot");
        println!("{}", handle.render());
    }
    Ok(())
}

fn install_metrics_recorder() -> Result<PrometheusHandle, AppError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|err| AppError::Metrics(Box::new(err)))
}
