use autotag_catalog::ProductView;
use serde::de::{Deserializer, IgnoredAny};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::condition::{Condition, ConditionOutcome};

/// Boolean combinator used between conditions in a group and between
/// groups in a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Joiner::And => "AND",
            Joiner::Or => "OR",
        }
    }
}

impl Default for Joiner {
    fn default() -> Self {
        Joiner::And
    }
}

impl Serialize for Joiner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Joiner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Anything that is not literally "OR" normalizes to AND,
        // matching how persisted payloads have always been read.
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == "OR" { Joiner::Or } else { Joiner::And })
    }
}

/// A group of conditions combined by the group's joiner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    #[serde(default)]
    pub joiner: Joiner,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    /// Evaluates the group. An empty group never matches: a
    /// misconfigured or legacy-migrated rule must not silently match
    /// everything.
    pub fn matches(&self, product: &ProductView) -> bool {
        if self.conditions.is_empty() {
            return false;
        }

        let mut outcomes = self.conditions.iter().map(|condition| {
            let outcome = condition.evaluate(product);
            if let ConditionOutcome::Skipped(reason) = outcome {
                debug!(
                    field = condition.field.as_str(),
                    operator = condition.operator.as_str(),
                    ?reason,
                    "condition skipped"
                );
            }
            outcome.is_match()
        });

        match self.joiner {
            Joiner::Or => outcomes.any(|matched| matched),
            Joiner::And => outcomes.all(|matched| matched),
        }
    }
}

/// A rule's full condition model: groups combined by a rule-level joiner.
///
/// Deserialization normalizes legacy shapes once: a flat condition list
/// becomes a single AND group, and anything unrecognizable becomes the
/// empty model, which never matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ConditionsPayload")]
pub struct RuleConditions {
    pub group_joiner: Joiner,
    pub groups: Vec<ConditionGroup>,
}

impl RuleConditions {
    /// Grouped boolean evaluation. Each group contributes its own
    /// result (empty groups contribute `false`); group results combine
    /// via the rule-level joiner; a rule with no groups never matches.
    pub fn matches(&self, product: &ProductView) -> bool {
        if self.groups.is_empty() {
            return false;
        }

        let mut results = self.groups.iter().map(|group| group.matches(product));
        match self.group_joiner {
            Joiner::Or => results.any(|matched| matched),
            Joiner::And => results.all(|matched| matched),
        }
    }

    /// Total number of conditions across all groups.
    pub fn condition_count(&self) -> usize {
        self.groups.iter().map(|group| group.conditions.len()).sum()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConditionsPayload {
    Grouped {
        #[serde(default, rename = "groupJoiner")]
        group_joiner: Joiner,
        groups: Vec<ConditionGroup>,
    },
    Legacy(Vec<Condition>),
    Other(IgnoredAny),
}

impl From<ConditionsPayload> for RuleConditions {
    fn from(payload: ConditionsPayload) -> Self {
        match payload {
            ConditionsPayload::Grouped {
                group_joiner,
                groups,
            } => Self {
                group_joiner,
                groups,
            },
            ConditionsPayload::Legacy(conditions) => Self {
                group_joiner: Joiner::And,
                groups: vec![ConditionGroup {
                    joiner: Joiner::And,
                    conditions,
                }],
            },
            ConditionsPayload::Other(_) => Self::default(),
        }
    }
}
