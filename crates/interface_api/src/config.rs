//! API configuration

use serde::{Deserialize, Serialize};

use domain_policy::adapters::FraudApiConfig;
use infra_messaging::MessagingConfig;

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level, overridden by `RUST_LOG`
    pub log_level: String,
    /// `pretty` or `json`
    pub log_format: String,
    pub fraud_api: FraudApiConfig,
    pub messaging: MessagingConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/policy_lifecycle".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            fraud_api: FraudApiConfig::default(),
            messaging: MessagingConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from the environment over the defaults
    ///
    /// Variables use the `API_` prefix with `__` between nested keys, e.g.
    /// `API_PORT=9000` or `API_FRAUD_API__BASE_URL=http://fraud:9090`.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(environment())
    }

    fn load<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_url", defaults.database_url)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", defaults.log_format)?
            .set_default("fraud_api.base_url", defaults.fraud_api.base_url)?
            .set_default("fraud_api.timeout_secs", defaults.fraud_api.timeout_secs as i64)?
            .set_default("messaging.exchange", defaults.messaging.exchange)?
            .set_default("messaging.routing_key", defaults.messaging.routing_key)?
            .set_default("messaging.binding_key", defaults.messaging.binding_key)?
            .set_default("messaging.queue", defaults.messaging.queue)?
            .set_default("messaging.dead_letter_queue", defaults.messaging.dead_letter_queue)?
            .set_default("messaging.queue_capacity", defaults.messaging.queue_capacity as i64)?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("API")
        .prefix_separator("_")
        .separator("__")
}
