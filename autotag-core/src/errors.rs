use std::io;

use thiserror::Error;

/// Result type used across the autotag core crate.
pub type Result<T> = std::result::Result<T, AutotagError>;

/// Canonical error representation shared by all services.
#[derive(Debug, Error)]
pub enum AutotagError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("general error: {0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for AutotagError {
    fn from(err: serde_json::Error) -> Self {
        AutotagError::DeserializationError(err.to_string())
    }
}

impl From<sqlx::Error> for AutotagError {
    fn from(err: sqlx::Error) -> Self {
        AutotagError::DatabaseError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {message}")]
    InvalidEnvVar { key: &'static str, message: String },
}

impl From<ConfigError> for AutotagError {
    fn from(value: ConfigError) -> Self {
        AutotagError::ConfigError(value.to_string())
    }
}
