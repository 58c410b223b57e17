//! Engine configuration.
//!
//! Loaded from `KEYSTONE_*` environment variables with fallback to defaults.
//!
//! | Variable                      | Default         |
//! |-------------------------------|-----------------|
//! | `KEYSTONE_TAX_RATE_BPS`       | `1000` (10%)    |
//! | `KEYSTONE_DB_PATH`            | `./keystone.db` |
//! | `KEYSTONE_DB_MAX_CONNECTIONS` | `5`             |
//! | `KEYSTONE_ORDER_PREFIX`       | `ORD`           |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use keystone_core::validation::validate_tax_rate_bps;
use keystone_core::{TaxRate, DEFAULT_TAX_RATE_BPS};
use keystone_db::DbConfig;

pub const ENV_TAX_RATE_BPS: &str = "KEYSTONE_TAX_RATE_BPS";
pub const ENV_DB_PATH: &str = "KEYSTONE_DB_PATH";
pub const ENV_DB_MAX_CONNECTIONS: &str = "KEYSTONE_DB_MAX_CONNECTIONS";
pub const ENV_ORDER_PREFIX: &str = "KEYSTONE_ORDER_PREFIX";

const MAX_ORDER_PREFIX_LEN: usize = 8;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Flat tax rate applied to every order subtotal.
    pub tax_rate: TaxRate,

    /// SQLite database file.
    pub db_path: PathBuf,

    /// Pool size.
    pub db_max_connections: u32,

    /// Leading segment of generated order numbers (`ORD-20240115-...`).
    pub order_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tax_rate: TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
            db_path: PathBuf::from("./keystone.db"),
            db_max_connections: 5,
            order_prefix: "ORD".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset keys take their default; set-but-invalid keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let tax_rate_bps: u32 = match lookup(ENV_TAX_RATE_BPS) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_TAX_RATE_BPS.to_string()))?,
            None => defaults.tax_rate.bps(),
        };
        validate_tax_rate_bps(tax_rate_bps)
            .map_err(|_| ConfigError::InvalidValue(ENV_TAX_RATE_BPS.to_string()))?;

        let db_path = lookup(ENV_DB_PATH)
            .map(|p| PathBuf::from(p.trim()))
            .unwrap_or(defaults.db_path);
        if db_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(ENV_DB_PATH.to_string()));
        }

        let db_max_connections: u32 = match lookup(ENV_DB_MAX_CONNECTIONS) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_DB_MAX_CONNECTIONS.to_string()))?,
            None => defaults.db_max_connections,
        };
        if db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(ENV_DB_MAX_CONNECTIONS.to_string()));
        }

        let order_prefix = lookup(ENV_ORDER_PREFIX)
            .map(|p| p.trim().to_string())
            .unwrap_or(defaults.order_prefix);
        if order_prefix.is_empty()
            || order_prefix.len() > MAX_ORDER_PREFIX_LEN
            || !order_prefix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::InvalidValue(ENV_ORDER_PREFIX.to_string()));
        }

        Ok(EngineConfig {
            tax_rate: TaxRate::from_bps(tax_rate_bps),
            db_path,
            db_max_connections,
            order_prefix,
        })
    }

    /// Pool configuration for this engine's database.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path).max_connections(self.db_max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
