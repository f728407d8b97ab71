use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::reroute::RerouteServiceError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Scenario(serde_json::Error),
    Metrics(Box<dyn std::error::Error + Send + Sync>),
    Workflow(RerouteServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Scenario(err) => write!(f, "scenario error: {}", err),
            AppError::Metrics(err) => write!(f, "metrics error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
        }
    }
}

impl AppError {
    /// Process exit status: 2 when configuration or a scenario file is unusable, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Scenario(_) => 2,
            AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Metrics(_)
            | AppError::Workflow(_) => 1,
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Scenario(err) => Some(err),
            AppError::Metrics(err) => Some(&**err),
            AppError::Workflow(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Scenario(value)
    }
}

impl From<RerouteServiceError> for AppError {
    fn from(value: RerouteServiceError) -> Self {
        Self::Workflow(value)
    }
}
