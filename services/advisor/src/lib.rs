mod cli;
mod demo;
mod evaluate;
mod infra;
mod render;
mod scenario;

use route_advisor::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
