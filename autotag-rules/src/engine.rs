use std::collections::BTreeSet;

use autotag_catalog::ProductView;
use tracing::debug;

use crate::diff::TagDiff;
use crate::rule::Rule;

/// Runtime evaluator that folds a rule set into a tag diff per product.
#[derive(Debug, Default, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    /// Constructs an engine over the provided rules. Iteration order is
    /// preserved; it only affects `matched_rule_ids`, never the final
    /// tag set.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Borrow the underlying rule set.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Whether the engine contains no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates every enabled rule against the product and folds the
    /// matched rules' actions into a single before/after tag diff.
    /// Within one pass, removes always win over adds for the same tag.
    pub fn diff(&self, product: &ProductView) -> TagDiff {
        let before: BTreeSet<String> = product.tags.iter().cloned().collect();
        let mut matched_rule_ids = Vec::new();
        let mut tags_to_add: BTreeSet<String> = BTreeSet::new();
        let mut tags_to_remove: BTreeSet<String> = BTreeSet::new();

        for rule in &self.rules {
            if !rule.is_enabled() {
                continue;
            }
            if !rule.matches(product) {
                continue;
            }

            debug!(rule_id = %rule.id, product_id = %product.id, "rule matched product");
            matched_rule_ids.push(rule.id.clone());
            let (add_tags, remove_tags) = rule.actions.add_remove_tags();
            tags_to_add.extend(add_tags);
            tags_to_remove.extend(remove_tags);
        }

        let mut after = before.clone();
        after.extend(tags_to_add);
        for tag in &tags_to_remove {
            after.remove(tag);
        }

        let added_tags: Vec<String> = after.difference(&before).cloned().collect();
        let removed_tags: Vec<String> = before.difference(&after).cloned().collect();
        let changed = !added_tags.is_empty() || !removed_tags.is_empty();

        TagDiff {
            matched_rule_ids,
            before_tags: before.into_iter().collect(),
            after_tags: after.into_iter().collect(),
            added_tags,
            removed_tags,
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{RuleActions, TagAction};
    use crate::condition::{Condition, ConditionField, ConditionOperator};
    use crate::group::{ConditionGroup, Joiner, RuleConditions};
    use chrono::Utc;

    fn rule(id: &str, conditions: RuleConditions, actions: RuleActions) -> Rule {
        Rule {
            id: id.to_string(),
            shop: "demo.example".into(),
            name: id.to_string(),
            description: None,
            enabled: true,
            conditions,
            actions,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn match_all() -> RuleConditions {
        RuleConditions {
            group_joiner: Joiner::And,
            groups: vec![ConditionGroup {
                joiner: Joiner::And,
                conditions: vec![Condition::new(
                    ConditionField::Vendor,
                    ConditionOperator::Contains,
                    "",
                )],
            }],
        }
    }

    fn product_with_tags(tags: &[&str]) -> ProductView {
        ProductView {
            id: "p1".into(),
            vendor: "Acme".into(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            ..ProductView::default()
        }
    }

    #[test]
    fn removes_win_over_adds_for_the_same_tag() {
        let engine = RuleEngine::new(vec![
            rule(
                "adds-x",
                match_all(),
                RuleActions {
                    items: vec![TagAction::add(vec!["x".into()])],
                },
            ),
            rule(
                "removes-x",
                match_all(),
                RuleActions {
                    items: vec![TagAction::remove(vec!["x".into()])],
                },
            ),
        ]);

        let diff = engine.diff(&product_with_tags(&[]));
        assert_eq!(
            diff.matched_rule_ids,
            vec!["adds-x".to_string(), "removes-x".to_string()]
        );
        assert!(!diff.after_tags.contains(&"x".to_string()));
        assert!(!diff.changed);
    }

    #[test]
    fn diff_is_idempotent() {
        let engine = RuleEngine::new(vec![rule(
            "tagger",
            match_all(),
            RuleActions {
                items: vec![
                    TagAction::add(vec!["sale".into()]),
                    TagAction::remove(vec!["archived".into()]),
                ],
            },
        )]);

        let product = product_with_tags(&["archived", "featured"]);
        let first = engine.diff(&product);
        assert!(first.changed);
        assert_eq!(
            first.after_tags,
            vec!["featured".to_string(), "sale".to_string()]
        );
        assert_eq!(first.added_tags, vec!["sale".to_string()]);
        assert_eq!(first.removed_tags, vec!["archived".to_string()]);

        let mut updated = product.clone();
        updated.tags = first.after_tags.clone();
        let second = engine.diff(&updated);
        assert!(!second.changed);
        assert_eq!(second.after_tags, first.after_tags);
    }

    #[test]
    fn disabled_rules_are_skipped_entirely() {
        let mut disabled = rule(
            "disabled",
            match_all(),
            RuleActions {
                items: vec![TagAction::add(vec!["never".into()])],
            },
        );
        disabled.enabled = false;

        let diff = RuleEngine::new(vec![disabled]).diff(&product_with_tags(&[]));
        assert!(diff.matched_rule_ids.is_empty());
        assert!(!diff.changed);
    }

    #[test]
    fn rule_with_only_empty_groups_never_matches() {
        let empty_conditions = RuleConditions {
            group_joiner: Joiner::Or,
            groups: vec![ConditionGroup::default()],
        };
        let diff = RuleEngine::new(vec![rule(
            "empty",
            empty_conditions,
            RuleActions {
                items: vec![TagAction::add(vec!["never".into()])],
            },
        )])
        .diff(&product_with_tags(&[]));

        assert!(diff.matched_rule_ids.is_empty());
        assert!(!diff.changed);
    }

    #[test]
    fn duplicate_tags_across_rules_are_deduplicated() {
        let engine = RuleEngine::new(vec![
            rule(
                "first",
                match_all(),
                RuleActions {
                    items: vec![TagAction::add(vec!["sale".into()])],
                },
            ),
            rule(
                "second",
                match_all(),
                RuleActions {
                    items: vec![TagAction::add(vec!["sale".into()])],
                },
            ),
        ]);

        let diff = engine.diff(&product_with_tags(&[]));
        assert_eq!(diff.after_tags, vec!["sale".to_string()]);
        assert_eq!(diff.added_tags, vec!["sale".to_string()]);
    }

    #[test]
    fn output_tag_lists_are_sorted() {
        let engine = RuleEngine::new(vec![rule(
            "tagger",
            match_all(),
            RuleActions {
                items: vec![TagAction::add(vec!["zebra".into(), "apple".into()])],
            },
        )]);

        let diff = engine.diff(&product_with_tags(&["mango"]));
        assert_eq!(
            diff.after_tags,
            vec!["apple".to_string(), "mango".to_string(), "zebra".to_string()]
        );
    }
}
