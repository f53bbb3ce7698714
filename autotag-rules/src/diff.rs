use serde::{Deserialize, Serialize};

/// Computed tag changes for one product against one rule set.
///
/// Tag lists are sorted lexicographically; `changed` is true iff any tag
/// was added or removed. The computation is pure and idempotent:
/// re-running it against the already-updated product yields
/// `changed = false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDiff {
    /// Ids of the matched rules, in rule iteration order.
    pub matched_rule_ids: Vec<String>,
    pub before_tags: Vec<String>,
    pub after_tags: Vec<String>,
    pub added_tags: Vec<String>,
    pub removed_tags: Vec<String>,
    pub changed: bool,
}
