//! Rule evaluation engine for the autotag system.
//!
//! Rules are boolean conditions over product attributes grouped with
//! AND/OR joiners; when a rule matches, its actions add or remove tags.
//! The engine is pure and fail-closed: evaluation never raises, malformed
//! or legacy-shaped payloads are normalized at deserialization time, and
//! anything the evaluator cannot interpret counts as a non-match.

mod action;
mod condition;
mod diff;
mod engine;
mod error;
mod group;
mod rule;
mod store;
mod validate;

pub use action::{split_tags, ActionKind, RuleActions, TagAction};
pub use condition::{Condition, ConditionField, ConditionOperator, ConditionOutcome, SkipReason};
pub use diff::TagDiff;
pub use engine::RuleEngine;
pub use error::RuleError;
pub use group::{ConditionGroup, Joiner, RuleConditions};
pub use rule::Rule;
pub use store::{RuleProvider, RuleQuery, RuleStore, SortOrder, StatusFilter};
pub use validate::{
    is_supported, supported_operators, validate_actions, validate_conditions, RuleDraft,
    MAX_ACTIVE_RULES_PER_SHOP,
};
