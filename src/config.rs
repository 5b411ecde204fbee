// config.rs
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    // None runs on the in-memory store
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub port: u16,
    pub payment_success_rate: f64,
    pub upi_success_rate: f64,
    pub refund_success_rate: f64,
    pub gateway_latency_ms: u64,
    pub allowed_origins: Vec<String>,
    pub log_level: String,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; `init` reads the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let jwt_secret = optional("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let allowed_origins = optional("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:5173".to_string(), "http://localhost:8000".to_string()]);

        Ok(Config {
            database_url: optional("DATABASE_URL"),
            redis_url: optional("REDIS_URL"),
            jwt_secret,
            port: parse_or(&lookup, "PORT", 8000)?,
            payment_success_rate: rate_or(&lookup, "PAYMENT_SUCCESS_RATE", 0.90)?,
            upi_success_rate: rate_or(&lookup, "UPI_SUCCESS_RATE", 0.95)?,
            refund_success_rate: rate_or(&lookup, "REFUND_SUCCESS_RATE", 0.98)?,
            gateway_latency_ms: parse_or(&lookup, "GATEWAY_LATENCY_MS", 2000)?,
            allowed_origins,
            log_level: optional("LOG_LEVEL").unwrap_or_else(|| "debug".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn rate_or<F>(lookup: &F, name: &'static str, default: f64) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let rate = parse_or(lookup, name, default)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: rate.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_with_only_the_secret() {
        let config = config_from(&[("JWT_SECRET_KEY", "s3cret")]).unwrap();

        assert!(config.database_url.is_none());
        assert!(config.redis_url.is_none());
        assert_eq!(config.port, 8000);
        assert_eq!(config.payment_success_rate, 0.90);
        assert_eq!(config.upi_success_rate, 0.95);
        assert_eq!(config.refund_success_rate, 0.98);
        assert_eq!(config.gateway_latency_ms, 2000);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn secret_is_required() {
        assert_eq!(config_from(&[]).unwrap_err(), ConfigError::Missing("JWT_SECRET_KEY"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("JWT_SECRET_KEY", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/fixigo"),
            ("PORT", "9090"),
            ("GATEWAY_LATENCY_MS", "0"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
        ])
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/fixigo"));
        assert_eq!(config.port, 9090);
        assert_eq!(config.gateway_latency_ms, 0);
        assert_eq!(config.allowed_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(matches!(
            config_from(&[("JWT_SECRET_KEY", "s"), ("PORT", "eighty")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        assert!(matches!(
            config_from(&[("JWT_SECRET_KEY", "s"), ("UPI_SUCCESS_RATE", "1.5")]),
            Err(ConfigError::Invalid { name: "UPI_SUCCESS_RATE", .. })
        ));
    }
}
