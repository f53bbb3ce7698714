use autotag_catalog::ProductView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::RuleActions;
use crate::group::RuleConditions;

/// Declarative tagging rule applied to catalog products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique identifier for the rule.
    pub id: String,
    /// Tenant key: the shop the rule belongs to.
    pub shop: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the rule participates in evaluation.
    #[serde(default = "Rule::default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub conditions: RuleConditions,
    #[serde(default)]
    pub actions: RuleActions,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    pub fn default_enabled() -> bool {
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the rule's condition model matches the product.
    pub fn matches(&self, product: &ProductView) -> bool {
        self.conditions.matches(product)
    }
}
