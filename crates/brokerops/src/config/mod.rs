use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::duplicates::DuplicatePolicy;
use crate::workflows::incidents::SlaPolicy;
use crate::workflows::reliability::FlagPolicy;

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
    pub trust: TrustConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            trust: TrustConfig::load()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tunables for the trust workflows, with the production defaults baked in.
#[derive(Debug, Clone, Copy)]
pub struct TrustConfig {
    pub review_threshold: f64,
    pub auto_hide_threshold: f64,
    pub flag_decay_days: i64,
    pub sla_cutoff_hour: u32,
}

impl TrustConfig {
    fn load() -> Result<Self, ConfigError> {
        let duplicate_defaults = DuplicatePolicy::default();
        let flag_defaults = FlagPolicy::default();
        let sla_defaults = SlaPolicy::default();

        Ok(Self {
            review_threshold: read_f64(
                "TRUST_REVIEW_THRESHOLD",
                duplicate_defaults.review_threshold,
            )?,
            auto_hide_threshold: read_f64(
                "TRUST_AUTO_HIDE_THRESHOLD",
                duplicate_defaults.auto_hide_threshold,
            )?,
            flag_decay_days: read_i64("TRUST_FLAG_DECAY_DAYS", flag_defaults.decay_days)?,
            sla_cutoff_hour: read_u32("TRUST_SLA_CUTOFF_HOUR", sla_defaults.cutoff_hour)?,
        })
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        DuplicatePolicy {
            review_threshold: self.review_threshold,
            auto_hide_threshold: self.auto_hide_threshold,
        }
    }

    pub fn sla_policy(&self) -> SlaPolicy {
        SlaPolicy {
            cutoff_hour: self.sla_cutoff_hour,
        }
    }

    pub fn flag_policy(&self) -> FlagPolicy {
        FlagPolicy {
            decay_days: self.flag_decay_days,
            ..FlagPolicy::default()
        }
    }
}

fn read_f64(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn read_i64(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn read_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must parse to a number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
