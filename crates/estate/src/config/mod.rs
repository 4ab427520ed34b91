use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::listings::{Offer, OfferDeletionPolicy};

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
    pub sales: SalesConfig,
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
        let include_target = environment != AppEnvironment::Production;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                include_target,
            },
            sales: SalesConfig::from_env()?,
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
    pub include_target: bool,
}

/// Agency commercial terms and workflow dials.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesConfig {
    /// Share of the selling price billed as commission when a property is sold.
    pub commission_rate: f64,
    /// Flat fee added to every sale invoice.
    pub administrative_fee: f64,
    pub invoicing_enabled: bool,
    pub offer_validity_days: i64,
    /// Lowest accepted selling price, as a fraction of the expected price.
    pub minimum_selling_ratio: f64,
    pub offer_deletion: OfferDeletionPolicy,
}

impl Default for SalesConfig {
    fn default() -> Self {
        Self {
            commission_rate: 0.06,
            administrative_fee: 100.0,
            invoicing_enabled: true,
            offer_validity_days: 7,
            minimum_selling_ratio: 0.9,
            offer_deletion: OfferDeletionPolicy::ResetAlways,
        }
    }
}

impl SalesConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let commission_rate = ratio_var("APP_COMMISSION_RATE", defaults.commission_rate)?;
        let minimum_selling_ratio =
            ratio_var("APP_MIN_SELLING_RATIO", defaults.minimum_selling_ratio)?;

        let administrative_fee = match env::var("APP_ADMIN_FEE") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|fee| fee.is_finite() && *fee >= 0.0)
                .ok_or(ConfigError::InvalidNumber {
                    key: "APP_ADMIN_FEE",
                    value: raw,
                })?,
            Err(_) => defaults.administrative_fee,
        };

        let invoicing_enabled = match env::var("APP_INVOICING") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidFlag {
                        key: "APP_INVOICING",
                        value: raw,
                    })
                }
            },
            Err(_) => defaults.invoicing_enabled,
        };

        let offer_validity_days = match env::var("APP_OFFER_VALIDITY_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| (0..=Offer::MAX_VALIDITY_DAYS).contains(days))
                .ok_or(ConfigError::InvalidNumber {
                    key: "APP_OFFER_VALIDITY_DAYS",
                    value: raw,
                })?,
            Err(_) => defaults.offer_validity_days,
        };

        let offer_deletion = match env::var("APP_OFFER_DELETION") {
            Ok(raw) => OfferDeletionPolicy::parse(&raw)
                .ok_or(ConfigError::InvalidDeletionPolicy { value: raw })?,
            Err(_) => defaults.offer_deletion,
        };

        Ok(Self {
            commission_rate,
            administrative_fee,
            invoicing_enabled,
            offer_validity_days,
            minimum_selling_ratio,
            offer_deletion,
        })
    }
}

fn ratio_var(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|ratio| (0.0..=1.0).contains(ratio))
            .ok_or(ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidFlag { key: &'static str, value: String },
    InvalidDeletionPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} has an out of range or non-numeric value '{value}'")
            }
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "{key} must be true or false, found '{value}'")
            }
            ConfigError::InvalidDeletionPolicy { value } => write!(
                f,
                "APP_OFFER_DELETION must be reset_always or reset_if_accepted, found '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
