use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CURRENCY: &str = "IDR";
const CONFIG_DIR: &str = "config";

/// Company profile applied when the settings collection is empty on first load.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CompanyDefaults {
    #[validate(length(min = 1, message = "Company name must not be empty"))]
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for CompanyDefaults {
    fn default() -> Self {
        Self {
            name: "PT Modular Global Tekindo".to_string(),
            address: "Jl. Manglid No.42, Margahayu Selatan, Bandung".to_string(),
            phone: "02254439313".to_string(),
            email: "admin@modularglobal.example".to_string(),
            currency: default_currency(),
        }
    }
}

/// Application configuration with validation.
///
/// Values are layered from `config/default`, `config/{run_env}`, and
/// `GUDANG_`-prefixed environment variables, in that order.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Directory holding the persisted JSON collections.
    #[serde(default = "default_data_dir")]
    #[validate(length(min = 1, message = "Data directory must not be empty"))]
    pub data_dir: String,

    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Runtime environment name (development, production, test).
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Credential for the optional AI advisory engine. Absence is not an
    /// error; the advisor degrades to its offline fallback.
    #[serde(default)]
    pub advisor_api_key: Option<String>,

    #[serde(default)]
    #[validate]
    pub company: CompanyDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            environment: default_environment(),
            advisor_api_key: None,
            company: CompanyDefaults::default(),
        }
    }
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string())
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl AppConfig {
    /// Loads configuration from the config directory and environment.
    ///
    /// Missing files are fine; every field has a default. Environment
    /// variables use the `GUDANG_` prefix with `__` as the section
    /// separator, e.g. `GUDANG_COMPANY__CURRENCY=USD`.
    pub fn load() -> Result<Self, ConfigError> {
        let run_env = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let config: AppConfig = Config::builder()
            .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
            .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
            .add_source(Environment::with_prefix("GUDANG").separator("__"))
            .build()?
            .try_deserialize()?;

        config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
