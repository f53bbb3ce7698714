use async_trait::async_trait;

use crate::error::CatalogError;
use crate::product::{ProductPage, ProductView};

/// Boundary to the catalog backend. All methods are scoped to one shop,
/// mirroring the per-shop API credentials a real backend requires.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches a single product, or `None` when it does not exist.
    async fn fetch_product(
        &self,
        shop: &str,
        product_id: &str,
    ) -> Result<Option<ProductView>, CatalogError>;

    /// Fetches the next page of products. `None` starts from the
    /// beginning; the returned `end_cursor` resumes where the page ended.
    async fn fetch_page(
        &self,
        shop: &str,
        cursor: Option<&str>,
    ) -> Result<ProductPage, CatalogError>;

    /// Replaces a product's tag set, returning the updated view. Fails
    /// when the downstream write reports field-level validation errors.
    async fn write_tags(
        &self,
        shop: &str,
        product_id: &str,
        tags: &[String],
    ) -> Result<ProductView, CatalogError>;
}
