use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::CatalogError;
use crate::product::{PageInfo, ProductPage, ProductView};
use crate::source::CatalogSource;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Record of one tag write accepted by the in-memory catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TagWrite {
    pub shop: String,
    pub product_id: String,
    pub tags: Vec<String>,
}

#[derive(Default)]
struct Inner {
    shops: HashMap<String, Vec<ProductView>>,
    writes: Vec<TagWrite>,
    write_failures: HashMap<String, String>,
    unreachable: HashSet<String>,
}

/// In-memory catalog source used by tests and local development.
///
/// Pagination cursors are stringified offsets into the shop's product
/// list; they are opaque to callers, as the trait requires.
#[derive(Clone)]
pub struct MemoryCatalog {
    inner: Arc<RwLock<Inner>>,
    page_size: usize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            page_size: page_size.max(1),
        }
    }

    /// Adds a product to the shop's catalog, preserving insertion order.
    pub fn insert_product(&self, shop: &str, product: ProductView) {
        let mut inner = self.inner.write();
        inner.shops.entry(shop.to_string()).or_default().push(product);
    }

    /// Makes every subsequent `write_tags` for the product fail with the
    /// given downstream validation message.
    pub fn fail_writes(&self, product_id: &str, message: &str) {
        let mut inner = self.inner.write();
        inner
            .write_failures
            .insert(product_id.to_string(), message.to_string());
    }

    /// Makes every subsequent page fetch for the shop fail.
    pub fn make_unreachable(&self, shop: &str) {
        let mut inner = self.inner.write();
        inner.unreachable.insert(shop.to_string());
    }

    /// Returns every tag write accepted so far, in order.
    pub fn writes(&self) -> Vec<TagWrite> {
        self.inner.read().writes.clone()
    }

    /// Returns the current stored view of a product.
    pub fn product(&self, shop: &str, product_id: &str) -> Option<ProductView> {
        let inner = self.inner.read();
        inner
            .shops
            .get(shop)
            .and_then(|products| products.iter().find(|p| p.id == product_id))
            .cloned()
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_cursor(cursor: Option<&str>) -> Result<usize, CatalogError> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| CatalogError::InvalidCursor(raw.to_string())),
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn fetch_product(
        &self,
        shop: &str,
        product_id: &str,
    ) -> Result<Option<ProductView>, CatalogError> {
        let inner = self.inner.read();
        if inner.unreachable.contains(shop) {
            return Err(CatalogError::Request(format!("shop {shop} unreachable")));
        }
        Ok(inner
            .shops
            .get(shop)
            .and_then(|products| products.iter().find(|p| p.id == product_id))
            .cloned())
    }

    async fn fetch_page(
        &self,
        shop: &str,
        cursor: Option<&str>,
    ) -> Result<ProductPage, CatalogError> {
        let offset = parse_cursor(cursor)?;
        let inner = self.inner.read();
        if inner.unreachable.contains(shop) {
            return Err(CatalogError::Request(format!("shop {shop} unreachable")));
        }

        let products = inner.shops.get(shop).map(Vec::as_slice).unwrap_or(&[]);
        let end = offset.saturating_add(self.page_size).min(products.len());
        let page: Vec<ProductView> = products
            .get(offset..end)
            .map(|slice| slice.to_vec())
            .unwrap_or_default();
        let has_next_page = end < products.len();
        let end_cursor = if page.is_empty() {
            None
        } else {
            Some(end.to_string())
        };

        Ok(ProductPage {
            products: page,
            page_info: PageInfo {
                has_next_page,
                end_cursor,
            },
        })
    }

    async fn write_tags(
        &self,
        shop: &str,
        product_id: &str,
        tags: &[String],
    ) -> Result<ProductView, CatalogError> {
        let mut inner = self.inner.write();
        if let Some(message) = inner.write_failures.get(product_id) {
            return Err(CatalogError::WriteRejected(message.clone()));
        }

        let product = inner
            .shops
            .get_mut(shop)
            .and_then(|products| products.iter_mut().find(|p| p.id == product_id))
            .ok_or_else(|| CatalogError::ProductNotFound(product_id.to_string()))?;

        product.tags = tags.to_vec();
        let updated = product.clone();
        debug!(shop, product_id, tag_count = tags.len(), "updated product tags");
        inner.writes.push(TagWrite {
            shop: shop.to_string(),
            product_id: product_id.to_string(),
            tags: tags.to_vec(),
        });

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str) -> ProductView {
        ProductView {
            id: id.to_string(),
            title: format!("Product {id}"),
            ..ProductView::default()
        }
    }

    #[tokio::test]
    async fn pages_through_the_catalog_in_insertion_order() {
        let catalog = MemoryCatalog::with_page_size(2);
        for id in ["a", "b", "c"] {
            catalog.insert_product("shop", product(id));
        }

        let first = catalog.fetch_page("shop", None).await.expect("first page");
        assert_eq!(
            first.products.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(first.page_info.has_next_page);

        let cursor = first.page_info.end_cursor.expect("cursor");
        let second = catalog
            .fetch_page("shop", Some(&cursor))
            .await
            .expect("second page");
        assert_eq!(second.products.len(), 1);
        assert_eq!(second.products[0].id, "c");
        assert!(!second.page_info.has_next_page);
    }

    #[tokio::test]
    async fn rejects_foreign_cursors() {
        let catalog = MemoryCatalog::new();
        let err = catalog
            .fetch_page("shop", Some("not-a-cursor"))
            .await
            .expect_err("cursor should be rejected");
        assert!(matches!(err, CatalogError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn records_tag_writes() {
        let catalog = MemoryCatalog::new();
        catalog.insert_product("shop", product("a"));

        let updated = catalog
            .write_tags("shop", "a", &["sale".to_string()])
            .await
            .expect("write should succeed");
        assert_eq!(updated.tags, vec!["sale".to_string()]);
        assert_eq!(catalog.writes().len(), 1);

        catalog.fail_writes("a", "tag contains invalid characters");
        let err = catalog
            .write_tags("shop", "a", &["bad".to_string()])
            .await
            .expect_err("write should fail");
        assert!(matches!(err, CatalogError::WriteRejected(_)));
    }
}
