use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::qualification::EvaluationConfig;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub qualification: QualificationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let qualification = match env::var("QUALIFY_MIN_DOWN_PAYMENT_RATIO") {
            Ok(raw) => QualificationConfig::from_ratio(&raw)?,
            Err(_) => QualificationConfig::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            qualification,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tunables for the qualification decision engine.
#[derive(Debug, Clone, PartialEq)]
pub struct QualificationConfig {
    pub minimum_down_payment_ratio: f64,
}

impl QualificationConfig {
    /// Parse a ratio in (0, 1], as accepted from the environment or the CLI.
    pub fn from_ratio(raw: &str) -> Result<Self, ConfigError> {
        let ratio = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidDownPaymentRatio(raw.to_string()))?;

        if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
            return Err(ConfigError::InvalidDownPaymentRatio(raw.to_string()));
        }

        Ok(Self {
            minimum_down_payment_ratio: ratio,
        })
    }

    pub fn evaluation_config(&self) -> EvaluationConfig {
        EvaluationConfig {
            minimum_down_payment_ratio: self.minimum_down_payment_ratio,
        }
    }
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            minimum_down_payment_ratio: EvaluationConfig::default().minimum_down_payment_ratio,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDownPaymentRatio(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDownPaymentRatio(value) => write!(
                f,
                "minimum down payment ratio must be a number in (0, 1], got '{}'",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDownPaymentRatio(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
