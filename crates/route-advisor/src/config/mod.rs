use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::workflows::reroute::{ApprovalPolicy, EvalPolicy, ExplainerSettings};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the advisor.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidValue {
                key: "APP_LOG_FORMAT",
                value: raw,
            })?,
            Err(_) => LogFormat::Compact,
        };

        let pipeline = PipelineConfig {
            provider_timeout: Duration::from_secs(parse_var(
                "ADVISOR_PROVIDER_TIMEOUT_SECS",
                10u64,
            )?),
            explainer_enabled: parse_flag("ADVISOR_EXPLAINER_ENABLED", true)?,
            explainer_timeout: Duration::from_secs(parse_var(
                "ADVISOR_EXPLAINER_TIMEOUT_SECS",
                20u64,
            )?),
            min_score_delta: parse_var("ADVISOR_MIN_SCORE_DELTA", 0.03f64)?,
            max_auto_cost_usd: parse_var("ADVISOR_MAX_AUTO_COST_USD", 100_000.0f64)?,
            max_risk_increase: parse_var("ADVISOR_MAX_RISK_INCREASE", 0.2f64)?,
            cache_capacity: parse_var("ADVISOR_CACHE_CAPACITY", 100usize)?,
            cache_ttl: Duration::from_secs(parse_var("ADVISOR_CACHE_TTL_SECS", 300u64)?),
            sweep_concurrency: parse_var("ADVISOR_SWEEP_CONCURRENCY", 8usize)?,
        };
        pipeline.validate()?;

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level, format },
            pipeline,
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

/// Tracing output controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Thresholds, timeouts, and sizing for the reroute pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub provider_timeout: Duration,
    pub explainer_enabled: bool,
    pub explainer_timeout: Duration,
    pub min_score_delta: f64,
    pub max_auto_cost_usd: f64,
    pub max_risk_increase: f64,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub sweep_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            explainer_enabled: true,
            explainer_timeout: Duration::from_secs(20),
            min_score_delta: 0.03,
            max_auto_cost_usd: 100_000.0,
            max_risk_increase: 0.2,
            cache_capacity: 100,
            cache_ttl: Duration::from_secs(300),
            sweep_concurrency: 8,
        }
    }
}

impl PipelineConfig {
    /// Fail fast on any threshold the typed policies would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.eval_policy()?;
        self.approval_policy()?;
        self.explainer_settings()?;
        if self.provider_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "ADVISOR_PROVIDER_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        if self.sweep_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ADVISOR_SWEEP_CONCURRENCY",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn eval_policy(&self) -> Result<EvalPolicy, ConfigError> {
        EvalPolicy::new(self.min_score_delta)
    }

    pub fn approval_policy(&self) -> Result<ApprovalPolicy, ConfigError> {
        ApprovalPolicy::new(self.max_auto_cost_usd, self.max_risk_increase)
    }

    pub fn explainer_settings(&self) -> Result<ExplainerSettings, ConfigError> {
        ExplainerSettings::new(self.explainer_enabled, self.explainer_timeout)
    }
}

/// Configuration errors. Always fatal at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
    InvalidWeights { sum: f64 },
    NegativeWeight { name: &'static str, value: f64 },
    InvalidThreshold { name: &'static str, value: f64 },
    InvalidCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an unparseable value '{value}'")
            }
            ConfigError::InvalidWeights { sum } => {
                write!(f, "scoring weights must sum to 1.0 (found {sum:.6})")
            }
            ConfigError::NegativeWeight { name, value } => {
                write!(f, "weight '{name}' must be a finite non-negative number (found {value})")
            }
            ConfigError::InvalidThreshold { name, value } => {
                write!(f, "threshold '{name}' is out of range (found {value})")
            }
            ConfigError::InvalidCapacity => write!(f, "cache capacity must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}
