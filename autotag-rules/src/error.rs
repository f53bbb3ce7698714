use thiserror::Error;

/// Errors surfaced by the rule authoring and storage paths.
///
/// Evaluation never produces errors: malformed persisted data is
/// normalized or skipped (fail-closed), so this type only reaches the
/// rule-authoring caller.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid {0} payload")]
    InvalidPayload(&'static str),
    #[error("rule name is required")]
    NameRequired,
    #[error("at least one condition is required")]
    NoUsableConditions,
    #[error("at least one tag action is required")]
    NoUsableActions,
    #[error("maximum active rule limit reached ({limit}); disable an existing rule before enabling another")]
    ActiveRuleLimit { limit: usize },
    #[error("rule not found: {0}")]
    NotFound(String),
}
