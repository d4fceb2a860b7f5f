//! API server configuration.
//!
//! Layered with the `config` crate:
//!
//! ```text
//! built-in defaults ──► storefront.toml (optional) ──► STOREFRONT_* env vars
//! ```
//!
//! e.g. `STOREFRONT_BIND_ADDRESS=127.0.0.1:3000`, `STOREFRONT_LOG_LEVEL=debug`.

use std::net::SocketAddr;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use storefront_core::validation::validate_shipping_fee_cents;

/// Configuration file looked up in the working directory.
const CONFIG_FILE: &str = "storefront";

/// Environment variable prefix.
const ENV_PREFIX: &str = "STOREFRONT";

/// Storefront API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,

    /// SQLite database file (`:memory:` for a throwaway database)
    pub database_path: String,

    /// Directory where transfer receipts are stored
    pub upload_dir: PathBuf,

    /// Shipping fee used until an administrator saves a shipping configuration
    pub default_shipping_fee_cents: i64,

    /// Largest accepted receipt upload (default: 5MB)
    pub max_upload_bytes: usize,

    /// Log filter used when RUST_LOG is not set
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_address: "0.0.0.0:8080".to_string(),
            database_path: "./data/storefront.db".to_string(),
            upload_dir: PathBuf::from("./data/receipts"),
            default_shipping_fee_cents: 9900,
            max_upload_bytes: 5 * 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads defaults, then `storefront.toml`, then `STOREFRONT_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("database_path", defaults.database_path)?
            .set_default("upload_dir", defaults.upload_dir.to_string_lossy().to_string())?
            .set_default("default_shipping_fee_cents", defaults.default_shipping_fee_cents)?
            .set_default("max_upload_bytes", defaults.max_upload_bytes as i64)?
            .set_default("log_level", defaults.log_level)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Checks values the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }

        if self.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("upload_dir".to_string()));
        }

        if validate_shipping_fee_cents(self.default_shipping_fee_cents).is_err() {
            return Err(ConfigError::InvalidValue(
                "default_shipping_fee_cents".to_string(),
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue("max_upload_bytes".to_string()));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|_| ConfigError::InvalidValue("bind_address".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
