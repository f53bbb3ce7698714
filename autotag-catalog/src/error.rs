use thiserror::Error;

/// Errors surfaced by catalog source implementations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog backend could not be reached or rejected the request.
    #[error("catalog request failed: {0}")]
    Request(String),
    /// The pagination cursor was not produced by this source.
    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),
    /// The downstream write reported field-level validation errors.
    #[error("tag write rejected: {0}")]
    WriteRejected(String),
    /// A write targeted a product the source does not know about.
    #[error("product not found: {0}")]
    ProductNotFound(String),
}
