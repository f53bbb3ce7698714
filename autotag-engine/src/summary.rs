use chrono::{DateTime, Utc};
use serde::Serialize;

use autotag_rules::{RuleQuery, RuleStore, MAX_ACTIVE_RULES_PER_SHOP};

use crate::error::EngineError;
use crate::store::RunStore;

/// Aggregated automation state for a shop's dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStatus {
    pub automation_active: bool,
    pub active_rule_count: usize,
    pub rule_limit: usize,
    /// When the most recent run finished, if any has.
    pub last_execution_at: Option<DateTime<Utc>>,
}

/// Computes the dashboard status from the rule and run stores.
pub async fn automation_status(
    rules: &RuleStore,
    runs: &dyn RunStore,
    shop: &str,
) -> Result<AutomationStatus, EngineError> {
    let active_rule_count = rules.active_rule_count(shop);
    let latest_run = runs.find_latest(shop).await?;

    Ok(AutomationStatus {
        automation_active: active_rule_count > 0,
        active_rule_count,
        rule_limit: MAX_ACTIVE_RULES_PER_SHOP,
        last_execution_at: latest_run.and_then(|run| run.finished_at),
    })
}

/// Compact rule row for the dashboard's recent-rules panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSummary {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub condition_count: usize,
    pub tag_count: usize,
}

/// The most recently created rules, newest first, reduced to the counts
/// the dashboard shows.
pub fn recent_rules(rules: &RuleStore, shop: &str, limit: usize) -> Vec<RuleSummary> {
    rules
        .list_rules(shop, &RuleQuery::default())
        .into_iter()
        .take(limit)
        .map(|rule| RuleSummary {
            condition_count: rule.conditions.condition_count(),
            tag_count: rule.actions.tag_count(),
            id: rule.id,
            name: rule.name,
            enabled: rule.enabled,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{RunPatch, RunStatus};
    use crate::store::MemoryRunStore;
    use autotag_rules::{
        Condition, ConditionField, ConditionGroup, ConditionOperator, Joiner, RuleActions,
        RuleConditions, RuleDraft, TagAction,
    };

    fn draft() -> RuleDraft {
        RuleDraft::new(
            "Wholesale",
            "",
            true,
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
                items: vec![TagAction::add(vec!["wholesale".into()])],
            },
        )
        .expect("draft validates")
    }

    #[tokio::test]
    async fn reflects_rule_count_and_latest_finished_run() {
        let rules = RuleStore::new();
        let runs = MemoryRunStore::new();

        let idle = automation_status(&rules, &runs, "shop").await.expect("status");
        assert!(!idle.automation_active);
        assert_eq!(idle.active_rule_count, 0);
        assert_eq!(idle.rule_limit, MAX_ACTIVE_RULES_PER_SHOP);
        assert!(idle.last_execution_at.is_none());

        rules.create_rule("shop", draft()).expect("rule persists");
        let run = runs.create("shop").await.expect("create");
        runs.update(
            run.id,
            RunPatch::new().status(RunStatus::Completed).finished_now(),
        )
        .await
        .expect("finalize");

        let active = automation_status(&rules, &runs, "shop").await.expect("status");
        assert!(active.automation_active);
        assert_eq!(active.active_rule_count, 1);
        assert!(active.last_execution_at.is_some());
    }

    #[test]
    fn recent_rules_reduce_to_counts() {
        let rules = RuleStore::new();
        rules.create_rule("shop", draft()).expect("rule persists");

        let recent = recent_rules(&rules, "shop", 5);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name, "Wholesale");
        assert_eq!(recent[0].condition_count, 1);
        assert_eq!(recent[0].tag_count, 1);
        assert!(recent[0].enabled);
    }
}
