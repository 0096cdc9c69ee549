use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::services::synthetic_service::MAX_SYNTHETIC_DAYS;

pub const DEFAULT_ALPACA_BASE_URL: &str = "https://paper-api.alpaca.markets";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Parameters for the fabricated data set.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub num_days: usize,
    pub initial_value: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_days: 365,
            initial_value: 100_000.0,
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct BrokerageConfig {
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSourceConfig {
    Synthetic(SyntheticConfig),
    Alpaca(BrokerageConfig),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Access gate secret. Never logged.
    pub dashboard_password: String,
    pub data_source: DataSourceConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dashboard_password = lookup("DASHBOARD_PASSWORD")
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::Missing("DASHBOARD_PASSWORD"))?;

        let bind_addr = parse_or("BIND_ADDR", lookup("BIND_ADDR"), SocketAddr::from(([0, 0, 0, 0], 3000)))?;

        let source = lookup("DATA_SOURCE").unwrap_or_else(|| "synthetic".to_string());
        let data_source = match source.to_lowercase().as_str() {
            "synthetic" => {
                let defaults = SyntheticConfig::default();
                let synthetic = SyntheticConfig {
                    seed: parse_or("SYNTHETIC_SEED", lookup("SYNTHETIC_SEED"), defaults.seed)?,
                    num_days: parse_or("SYNTHETIC_DAYS", lookup("SYNTHETIC_DAYS"), defaults.num_days)?,
                    initial_value: parse_or(
                        "SYNTHETIC_INITIAL_VALUE",
                        lookup("SYNTHETIC_INITIAL_VALUE"),
                        defaults.initial_value,
                    )?,
                };
                if synthetic.num_days < 2 {
                    return Err(invalid("SYNTHETIC_DAYS", synthetic.num_days, "must be at least 2"));
                }
                if synthetic.num_days > MAX_SYNTHETIC_DAYS {
                    return Err(invalid(
                        "SYNTHETIC_DAYS",
                        synthetic.num_days,
                        format!("must be at most {}", MAX_SYNTHETIC_DAYS),
                    ));
                }
                if !(synthetic.initial_value.is_finite() && synthetic.initial_value > 0.0) {
                    return Err(invalid("SYNTHETIC_INITIAL_VALUE", synthetic.initial_value, "must be positive"));
                }
                DataSourceConfig::Synthetic(synthetic)
            }
            "alpaca" => {
                let base_url = lookup("APCA_API_BASE_URL").unwrap_or_else(|| DEFAULT_ALPACA_BASE_URL.to_string());
                url::Url::parse(&base_url).map_err(|e| invalid("APCA_API_BASE_URL", &base_url, e))?;

                let timeout_secs: u64 = parse_or("BROKERAGE_TIMEOUT_SECS", lookup("BROKERAGE_TIMEOUT_SECS"), 10)?;

                DataSourceConfig::Alpaca(BrokerageConfig {
                    api_key: lookup("APCA_API_KEY_ID").ok_or(ConfigError::Missing("APCA_API_KEY_ID"))?,
                    secret_key: lookup("APCA_API_SECRET_KEY").ok_or(ConfigError::Missing("APCA_API_SECRET_KEY"))?,
                    base_url,
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            other => {
                return Err(invalid("DATA_SOURCE", other, "must be 'synthetic' or 'alpaca'"));
            }
        };

        Ok(Self {
            bind_addr,
            dashboard_password,
            data_source,
        })
    }
}

impl std::fmt::Debug for BrokerageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerageConfig")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("dashboard_password", &"<redacted>")
            .field("data_source", &self.data_source)
            .finish()
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e| invalid(name, &value, e)),
        None => Ok(default),
    }
}
