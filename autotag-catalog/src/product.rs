use serde::{Deserialize, Serialize};

/// Parses a decimal string, treating non-finite or non-numeric values as
/// absent rather than zero.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Price and stock data for a single product variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantView {
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub compare_at_price: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
}

impl VariantView {
    fn numeric_price(&self) -> Option<f64> {
        self.price.as_deref().and_then(parse_decimal)
    }

    fn numeric_compare_at_price(&self) -> Option<f64> {
        self.compare_at_price.as_deref().and_then(parse_decimal)
    }

    /// Whether the variant is discounted below its compare-at price.
    pub fn is_discounted(&self) -> bool {
        match (self.numeric_price(), self.numeric_compare_at_price()) {
            (Some(price), Some(compare_at)) => price < compare_at,
            _ => false,
        }
    }
}

/// Ephemeral view of one catalog product, produced per page by the
/// catalog source and discarded after evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Handles of the collections the product belongs to.
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default)]
    pub variants: Vec<VariantView>,
}

impl ProductView {
    /// Cheapest numeric variant price, or `None` if no variant carries a
    /// parseable price.
    pub fn min_variant_price(&self) -> Option<f64> {
        self.variants
            .iter()
            .filter_map(VariantView::numeric_price)
            .fold(None, |acc, price| match acc {
                Some(min) if min <= price => Some(min),
                _ => Some(price),
            })
    }

    /// Most expensive numeric variant price, or `None` if no variant
    /// carries a parseable price.
    pub fn max_variant_price(&self) -> Option<f64> {
        self.variants
            .iter()
            .filter_map(VariantView::numeric_price)
            .fold(None, |acc, price| match acc {
                Some(max) if max >= price => Some(max),
                _ => Some(price),
            })
    }

    /// Sum of the numeric variant inventory quantities. Variants without
    /// a quantity are excluded; a product with no numeric quantities sums
    /// to zero.
    pub fn total_inventory(&self) -> i64 {
        self.variants
            .iter()
            .filter_map(|variant| variant.inventory_quantity)
            .sum()
    }

    /// A product is on sale when any variant has both a price and a
    /// compare-at price and the price is strictly lower.
    pub fn is_on_sale(&self) -> bool {
        self.variants.iter().any(VariantView::is_discounted)
    }
}

/// Pagination marker returned alongside each product page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One page of catalog products.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<ProductView>,
    pub page_info: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(price: Option<&str>, compare_at: Option<&str>, quantity: Option<i64>) -> VariantView {
        VariantView {
            price: price.map(str::to_string),
            compare_at_price: compare_at.map(str::to_string),
            inventory_quantity: quantity,
        }
    }

    #[test]
    fn price_aggregates_skip_non_numeric_values() {
        let product = ProductView {
            id: "p1".into(),
            variants: vec![
                variant(Some("19.90"), None, None),
                variant(Some("not-a-price"), None, None),
                variant(Some("7.50"), None, None),
            ],
            ..ProductView::default()
        };

        assert_eq!(product.min_variant_price(), Some(7.50));
        assert_eq!(product.max_variant_price(), Some(19.90));
    }

    #[test]
    fn price_aggregates_are_absent_without_numeric_data() {
        let product = ProductView {
            id: "p1".into(),
            variants: vec![variant(None, None, None), variant(Some(""), None, None)],
            ..ProductView::default()
        };

        assert_eq!(product.min_variant_price(), None);
        assert_eq!(product.max_variant_price(), None);
    }

    #[test]
    fn inventory_defaults_to_zero() {
        let product = ProductView::default();
        assert_eq!(product.total_inventory(), 0);

        let stocked = ProductView {
            variants: vec![variant(None, None, Some(3)), variant(None, None, Some(4))],
            ..ProductView::default()
        };
        assert_eq!(stocked.total_inventory(), 7);
    }

    #[test]
    fn on_sale_requires_price_below_compare_at() {
        let on_sale = ProductView {
            variants: vec![variant(Some("10"), Some("15"), None)],
            ..ProductView::default()
        };
        assert!(on_sale.is_on_sale());

        let above_compare_at = ProductView {
            variants: vec![variant(Some("15"), Some("10"), None)],
            ..ProductView::default()
        };
        assert!(!above_compare_at.is_on_sale());

        let missing_compare_at = ProductView {
            variants: vec![variant(Some("10"), None, None)],
            ..ProductView::default()
        };
        assert!(!missing_compare_at.is_on_sale());
    }

    #[test]
    fn non_finite_prices_are_excluded() {
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal(" 12.5 "), Some(12.5));
        assert_eq!(parse_decimal(""), None);
    }
}
