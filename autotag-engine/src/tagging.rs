use tracing::info;

use autotag_catalog::CatalogSource;
use autotag_rules::{Rule, RuleEngine, RuleProvider, TagDiff};

use crate::error::EngineError;

/// Result of applying the rule set to a single product outside a bulk
/// run (the product-update event path).
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The shop has no enabled rules; nothing was evaluated.
    NoEnabledRules,
    /// The catalog does not know the product.
    ProductNotFound,
    /// The rules matched (or not) but the tag set is already correct.
    Unchanged { diff: TagDiff },
    /// Tags were written back to the catalog.
    Updated { diff: TagDiff },
}

/// Applies the shop's enabled rules to one product, writing tags only
/// when the diff reports a change.
pub async fn apply_rules_to_product(
    catalog: &dyn CatalogSource,
    rules: &dyn RuleProvider,
    shop: &str,
    product_id: &str,
) -> Result<ApplyOutcome, EngineError> {
    let enabled = rules.list_enabled(shop).await?;
    if enabled.is_empty() {
        return Ok(ApplyOutcome::NoEnabledRules);
    }

    let product = match catalog.fetch_product(shop, product_id).await? {
        Some(product) => product,
        None => return Ok(ApplyOutcome::ProductNotFound),
    };

    let diff = RuleEngine::new(enabled).diff(&product);
    if !diff.changed {
        return Ok(ApplyOutcome::Unchanged { diff });
    }

    catalog.write_tags(shop, &product.id, &diff.after_tags).await?;
    info!(
        shop,
        product_id,
        added = diff.added_tags.len(),
        removed = diff.removed_tags.len(),
        "applied rules to product"
    );

    Ok(ApplyOutcome::Updated { diff })
}

/// Evaluates one rule against one product without writing anything,
/// for rule-authoring previews.
pub async fn preview_rule(
    catalog: &dyn CatalogSource,
    rule: &Rule,
    shop: &str,
    product_id: &str,
) -> Result<Option<TagDiff>, EngineError> {
    let product = match catalog.fetch_product(shop, product_id).await? {
        Some(product) => product,
        None => return Ok(None),
    };

    Ok(Some(RuleEngine::new(vec![rule.clone()]).diff(&product)))
}
