use thiserror::Error;
use uuid::Uuid;

/// Errors that may occur when interacting with the run engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("run not found: {0}")]
    RunNotFound(Uuid),
    #[error("run store failure: {0}")]
    Store(String),
    #[error(transparent)]
    Catalog(#[from] autotag_catalog::CatalogError),
    #[error(transparent)]
    Rules(#[from] autotag_rules::RuleError),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Store(err.to_string())
    }
}
