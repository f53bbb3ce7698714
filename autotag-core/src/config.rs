use std::env;
use std::time::Duration;

use crate::errors::{AutotagError, ConfigError};

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Global configuration shared across the services.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    pub environment: Environment,
    pub poll_interval: Duration,
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".into()))?;

        let environment = env::var("AUTOTAG_ENV")
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let poll_interval = match env::var("AUTOTAG_POLL_INTERVAL_SECS") {
            Ok(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|err| ConfigError::InvalidEnvVar {
                        key: "AUTOTAG_POLL_INTERVAL_SECS",
                        message: err.to_string(),
                    })?;
                Duration::from_secs(secs.max(1))
            }
            Err(_) => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        };

        Ok(Self {
            database_url,
            environment,
            poll_interval,
        })
    }

    /// Returns the base Postgres URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

/// Helper that loads config and converts to the canonical autotag error type.
pub fn load_core_config() -> Result<CoreConfig, AutotagError> {
    Ok(CoreConfig::from_env()?)
}
