use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::action::ActionKind;
use crate::error::RuleError;
use crate::rule::Rule;
use crate::validate::{RuleDraft, MAX_ACTIVE_RULES_PER_SHOP};

/// Enabled-state filter for rule listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

/// Creation-time sort order for rule listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    CreatedDesc,
    CreatedAsc,
}

/// Listing filters exposed to rule-management callers.
#[derive(Debug, Clone, Default)]
pub struct RuleQuery {
    pub status: StatusFilter,
    pub sort: SortOrder,
    /// Case-insensitive substring match on the rule name.
    pub search: Option<String>,
    /// Keep only rules with at least one action of this kind.
    pub action_kind: Option<ActionKind>,
}

/// Read side of the rule store consumed by the run processor.
#[async_trait]
pub trait RuleProvider: Send + Sync {
    /// Enabled rules for the shop, most recently updated first.
    async fn list_enabled(&self, shop: &str) -> Result<Vec<Rule>, RuleError>;
}

/// In-memory multi-shop rule store.
///
/// Rules are kept in creation order per shop; the active-rule cap is
/// enforced here, at write time, never by the evaluator.
#[derive(Default, Clone)]
pub struct RuleStore {
    inner: Arc<RwLock<HashMap<String, Vec<Rule>>>>,
}

impl RuleStore {
    /// Creates a new empty rule store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists a validated draft as a new rule.
    pub fn create_rule(&self, shop: &str, draft: RuleDraft) -> Result<Rule, RuleError> {
        let mut inner = self.inner.write();
        if draft.enabled {
            Self::check_active_limit(&inner, shop, None)?;
        }

        let now = Utc::now();
        let rule = Rule {
            id: format!("rule-{}", Uuid::new_v4()),
            shop: shop.to_string(),
            name: draft.name,
            description: draft.description,
            enabled: draft.enabled,
            conditions: draft.conditions,
            actions: draft.actions,
            created_at: now,
            updated_at: now,
        };

        inner.entry(shop.to_string()).or_default().push(rule.clone());
        Ok(rule)
    }

    /// Replaces a rule's payload with a validated draft.
    pub fn update_rule(&self, shop: &str, rule_id: &str, draft: RuleDraft) -> Result<Rule, RuleError> {
        let mut inner = self.inner.write();

        let currently_enabled = inner
            .get(shop)
            .and_then(|rules| rules.iter().find(|rule| rule.id == rule_id))
            .map(|rule| rule.enabled)
            .ok_or_else(|| RuleError::NotFound(rule_id.to_string()))?;

        // The cap only applies when a disabled rule is being enabled.
        if draft.enabled && !currently_enabled {
            Self::check_active_limit(&inner, shop, Some(rule_id))?;
        }

        let rules = inner
            .get_mut(shop)
            .ok_or_else(|| RuleError::NotFound(rule_id.to_string()))?;
        let rule = rules
            .iter_mut()
            .find(|rule| rule.id == rule_id)
            .ok_or_else(|| RuleError::NotFound(rule_id.to_string()))?;

        rule.name = draft.name;
        rule.description = draft.description;
        rule.enabled = draft.enabled;
        rule.conditions = draft.conditions;
        rule.actions = draft.actions;
        rule.updated_at = Utc::now();

        Ok(rule.clone())
    }

    /// Deletes a rule.
    pub fn delete_rule(&self, shop: &str, rule_id: &str) -> Result<(), RuleError> {
        let mut inner = self.inner.write();
        let rules = inner
            .get_mut(shop)
            .ok_or_else(|| RuleError::NotFound(rule_id.to_string()))?;

        let before = rules.len();
        rules.retain(|rule| rule.id != rule_id);
        if rules.len() == before {
            return Err(RuleError::NotFound(rule_id.to_string()));
        }
        Ok(())
    }

    /// Fetches a single rule.
    pub fn rule(&self, shop: &str, rule_id: &str) -> Option<Rule> {
        let inner = self.inner.read();
        inner
            .get(shop)
            .and_then(|rules| rules.iter().find(|rule| rule.id == rule_id))
            .cloned()
    }

    /// Lists the shop's rules according to the query filters.
    pub fn list_rules(&self, shop: &str, query: &RuleQuery) -> Vec<Rule> {
        let inner = self.inner.read();
        let mut rules: Vec<Rule> = inner
            .get(shop)
            .map(|rules| {
                rules
                    .iter()
                    .filter(|rule| match query.status {
                        StatusFilter::All => true,
                        StatusFilter::Active => rule.enabled,
                        StatusFilter::Inactive => !rule.enabled,
                    })
                    .filter(|rule| match &query.search {
                        Some(needle) => rule
                            .name
                            .to_lowercase()
                            .contains(&needle.trim().to_lowercase()),
                        None => true,
                    })
                    .filter(|rule| match query.action_kind {
                        Some(kind) => rule.actions.items.iter().any(|item| item.kind == kind),
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        match query.sort {
            SortOrder::CreatedAsc => rules.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::CreatedDesc => rules.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        rules
    }

    /// Enabled rules for the shop, most recently updated first.
    pub fn enabled_rules(&self, shop: &str) -> Vec<Rule> {
        let inner = self.inner.read();
        let mut rules: Vec<Rule> = inner
            .get(shop)
            .map(|rules| rules.iter().filter(|rule| rule.enabled).cloned().collect())
            .unwrap_or_default();
        rules.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rules
    }

    /// Number of enabled rules for the shop.
    pub fn active_rule_count(&self, shop: &str) -> usize {
        let inner = self.inner.read();
        inner
            .get(shop)
            .map(|rules| rules.iter().filter(|rule| rule.enabled).count())
            .unwrap_or(0)
    }

    fn check_active_limit(
        inner: &HashMap<String, Vec<Rule>>,
        shop: &str,
        exclude_rule_id: Option<&str>,
    ) -> Result<(), RuleError> {
        let active = inner
            .get(shop)
            .map(|rules| {
                rules
                    .iter()
                    .filter(|rule| rule.enabled)
                    .filter(|rule| exclude_rule_id != Some(rule.id.as_str()))
                    .count()
            })
            .unwrap_or(0);

        if active >= MAX_ACTIVE_RULES_PER_SHOP {
            return Err(RuleError::ActiveRuleLimit {
                limit: MAX_ACTIVE_RULES_PER_SHOP,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RuleProvider for RuleStore {
    async fn list_enabled(&self, shop: &str) -> Result<Vec<Rule>, RuleError> {
        Ok(self.enabled_rules(shop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{RuleActions, TagAction};
    use crate::condition::{Condition, ConditionField, ConditionOperator};
    use crate::group::{ConditionGroup, Joiner, RuleConditions};

    fn draft(name: &str, enabled: bool) -> RuleDraft {
        RuleDraft::new(
            name,
            "",
            enabled,
            RuleConditions {
                group_joiner: Joiner::And,
                groups: vec![ConditionGroup {
                    joiner: Joiner::And,
                    conditions: vec![Condition::new(
                        ConditionField::Vendor,
                        ConditionOperator::Contains,
                        "acme",
                    )],
                }],
            },
            RuleActions {
                items: vec![TagAction::add(vec!["sale".into()])],
            },
        )
        .expect("draft should validate")
    }

    fn removal_draft(name: &str) -> RuleDraft {
        let mut base = draft(name, true);
        base.actions = RuleActions {
            items: vec![TagAction::remove(vec!["old".into()])],
        };
        base
    }

    #[test]
    fn creates_and_lists_rules() {
        let store = RuleStore::new();
        let rule = store
            .create_rule("shop", draft("Wholesale", true))
            .expect("create should succeed");
        assert!(rule.id.starts_with("rule-"));

        let listed = store.list_rules("shop", &RuleQuery::default());
        assert_eq!(listed.len(), 1);
        assert_eq!(store.active_rule_count("shop"), 1);
    }

    #[test]
    fn enforces_the_active_rule_cap() {
        let store = RuleStore::new();
        for index in 0..MAX_ACTIVE_RULES_PER_SHOP {
            store
                .create_rule("shop", draft(&format!("rule {index}"), true))
                .expect("rules under the cap should persist");
        }

        let err = store
            .create_rule("shop", draft("one too many", true))
            .expect_err("cap should be enforced");
        assert!(matches!(err, RuleError::ActiveRuleLimit { limit: 50 }));

        // Disabled rules do not count against the cap.
        store
            .create_rule("shop", draft("disabled is fine", false))
            .expect("disabled rules bypass the cap");
    }

    #[test]
    fn enabling_an_existing_rule_checks_the_cap() {
        let store = RuleStore::new();
        let disabled = store
            .create_rule("shop", draft("sleeper", false))
            .expect("create should succeed");
        for index in 0..MAX_ACTIVE_RULES_PER_SHOP {
            store
                .create_rule("shop", draft(&format!("rule {index}"), true))
                .expect("rules under the cap should persist");
        }

        let err = store
            .update_rule("shop", &disabled.id, draft("sleeper", true))
            .expect_err("enabling past the cap should fail");
        assert!(matches!(err, RuleError::ActiveRuleLimit { .. }));

        // Re-saving an already-enabled rule is never blocked by the cap.
        let existing = store.list_rules("shop", &RuleQuery::default());
        let enabled = existing.iter().find(|rule| rule.enabled).unwrap();
        store
            .update_rule("shop", &enabled.id, draft("renamed", true))
            .expect("updating an enabled rule should succeed");
    }

    #[test]
    fn filters_by_status_search_and_action_kind() {
        let store = RuleStore::new();
        store.create_rule("shop", draft("Wholesale adds", true)).unwrap();
        store.create_rule("shop", draft("Dormant", false)).unwrap();
        store.create_rule("shop", removal_draft("Cleanup removes")).unwrap();

        let active = store.list_rules(
            "shop",
            &RuleQuery {
                status: StatusFilter::Active,
                ..RuleQuery::default()
            },
        );
        assert_eq!(active.len(), 2);

        let searched = store.list_rules(
            "shop",
            &RuleQuery {
                search: Some("wholesale".into()),
                ..RuleQuery::default()
            },
        );
        assert_eq!(searched.len(), 1);

        let removers = store.list_rules(
            "shop",
            &RuleQuery {
                action_kind: Some(ActionKind::Remove),
                ..RuleQuery::default()
            },
        );
        assert_eq!(removers.len(), 1);
        assert_eq!(removers[0].name, "Cleanup removes");
    }

    #[test]
    fn delete_removes_the_rule() {
        let store = RuleStore::new();
        let rule = store.create_rule("shop", draft("Wholesale", true)).unwrap();
        store.delete_rule("shop", &rule.id).expect("delete should succeed");
        assert!(store.rule("shop", &rule.id).is_none());
        assert!(matches!(
            store.delete_rule("shop", &rule.id),
            Err(RuleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn provider_returns_only_enabled_rules() {
        let store = RuleStore::new();
        store.create_rule("shop", draft("On", true)).unwrap();
        store.create_rule("shop", draft("Off", false)).unwrap();

        let rules = store.list_enabled("shop").await.expect("listing succeeds");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "On");
    }
}
