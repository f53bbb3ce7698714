use crate::action::{split_tags, RuleActions, TagAction};
use crate::condition::{Condition, ConditionField, ConditionOperator};
use crate::error::RuleError;
use crate::group::{ConditionGroup, RuleConditions};

/// Cap on enabled rules per shop, enforced at write time to keep bulk
/// runs bounded.
pub const MAX_ACTIVE_RULES_PER_SHOP: usize = 50;

/// Operators accepted for each condition field at authoring time.
pub fn supported_operators(field: ConditionField) -> &'static [ConditionOperator] {
    use ConditionOperator::*;

    match field {
        ConditionField::Vendor | ConditionField::Collection => &[Contains, Equals],
        ConditionField::ProductType | ConditionField::Status | ConditionField::OnSale => &[Equals],
        ConditionField::Title => &[Contains],
        ConditionField::MinVariantPrice
        | ConditionField::MaxVariantPrice
        | ConditionField::Weight
        | ConditionField::InventoryQuantity => &[
            GreaterThan,
            GreaterThanOrEqual,
            LessThan,
            LessThanOrEqual,
            Equals,
        ],
        ConditionField::Unknown => &[],
    }
}

pub fn is_supported(field: ConditionField, operator: ConditionOperator) -> bool {
    supported_operators(field).contains(&operator)
}

/// Sanitizes a condition model for persistence: trims target values,
/// drops blank-valued conditions and unsupported field/operator pairs,
/// then drops groups left empty. Errors when nothing usable remains.
pub fn validate_conditions(model: RuleConditions) -> Result<RuleConditions, RuleError> {
    let groups: Vec<ConditionGroup> = model
        .groups
        .into_iter()
        .map(|group| ConditionGroup {
            joiner: group.joiner,
            conditions: group
                .conditions
                .into_iter()
                .map(|condition| Condition {
                    value: condition.value.trim().to_string(),
                    ..condition
                })
                .filter(|condition| !condition.value.is_empty())
                .filter(|condition| is_supported(condition.field, condition.operator))
                .collect(),
        })
        .filter(|group| !group.conditions.is_empty())
        .collect();

    if groups.is_empty() {
        return Err(RuleError::NoUsableConditions);
    }

    Ok(RuleConditions {
        group_joiner: model.group_joiner,
        groups,
    })
}

/// Sanitizes an action list for persistence: re-splits comma-joined tag
/// text, trims, drops blanks and tag-less items. Errors when no item
/// remains.
pub fn validate_actions(actions: RuleActions) -> Result<RuleActions, RuleError> {
    let items: Vec<TagAction> = actions
        .items
        .into_iter()
        .map(|item| TagAction {
            kind: item.kind,
            tags: item.tags.iter().flat_map(|raw| split_tags(raw)).collect(),
        })
        .filter(|item| !item.tags.is_empty())
        .collect();

    if items.is_empty() {
        return Err(RuleError::NoUsableActions);
    }

    Ok(RuleActions { items })
}

/// A validated rule payload, ready to be persisted by the rule store.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub conditions: RuleConditions,
    pub actions: RuleActions,
}

impl RuleDraft {
    /// Validates the individual parts into a persistable draft.
    pub fn new(
        name: &str,
        description: &str,
        enabled: bool,
        conditions: RuleConditions,
        actions: RuleActions,
    ) -> Result<Self, RuleError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RuleError::NameRequired);
        }

        let description = description.trim();
        Ok(Self {
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            enabled,
            conditions: validate_conditions(conditions)?,
            actions: validate_actions(actions)?,
        })
    }

    /// Builds a draft from raw JSON condition/action payloads, the shape
    /// the rule-authoring surface submits.
    pub fn from_json(
        name: &str,
        description: &str,
        enabled: bool,
        conditions_json: &str,
        actions_json: &str,
    ) -> Result<Self, RuleError> {
        let conditions: RuleConditions = serde_json::from_str(conditions_json)
            .map_err(|_| RuleError::InvalidPayload("conditions"))?;
        let actions: RuleActions =
            serde_json::from_str(actions_json).map_err(|_| RuleError::InvalidPayload("actions"))?;

        Self::new(name, description, enabled, conditions, actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Joiner;

    fn grouped(conditions: Vec<Condition>) -> RuleConditions {
        RuleConditions {
            group_joiner: Joiner::And,
            groups: vec![ConditionGroup {
                joiner: Joiner::And,
                conditions,
            }],
        }
    }

    #[test]
    fn drops_unsupported_operator_pairs() {
        let model = grouped(vec![
            Condition::new(ConditionField::Title, ConditionOperator::Equals, "jacket"),
            Condition::new(ConditionField::Title, ConditionOperator::Contains, "jacket"),
        ]);

        let validated = validate_conditions(model).expect("one condition survives");
        assert_eq!(validated.groups[0].conditions.len(), 1);
        assert_eq!(
            validated.groups[0].conditions[0].operator,
            ConditionOperator::Contains
        );
    }

    #[test]
    fn errors_when_no_condition_survives() {
        let model = grouped(vec![
            Condition::new(ConditionField::Vendor, ConditionOperator::Contains, "   "),
            Condition::new(ConditionField::Unknown, ConditionOperator::Equals, "x"),
        ]);

        assert!(matches!(
            validate_conditions(model),
            Err(RuleError::NoUsableConditions)
        ));
    }

    #[test]
    fn trims_condition_values() {
        let model = grouped(vec![Condition::new(
            ConditionField::Vendor,
            ConditionOperator::Equals,
            "  acme  ",
        )]);

        let validated = validate_conditions(model).expect("condition survives");
        assert_eq!(validated.groups[0].conditions[0].value, "acme");
    }

    #[test]
    fn weight_conditions_are_accepted_at_authoring_time() {
        // The field validates even though the data source cannot
        // evaluate it yet.
        let model = grouped(vec![Condition::new(
            ConditionField::Weight,
            ConditionOperator::GreaterThan,
            "2",
        )]);
        assert!(validate_conditions(model).is_ok());
    }

    #[test]
    fn actions_resplit_comma_joined_text() {
        let actions = RuleActions {
            items: vec![TagAction::add(vec!["sale, new ,".into()])],
        };
        let validated = validate_actions(actions).expect("actions survive");
        assert_eq!(
            validated.items[0].tags,
            vec!["sale".to_string(), "new".to_string()]
        );
    }

    #[test]
    fn errors_when_no_action_survives() {
        let actions = RuleActions {
            items: vec![TagAction::add(vec!["  ".into()])],
        };
        assert!(matches!(
            validate_actions(actions),
            Err(RuleError::NoUsableActions)
        ));
    }

    #[test]
    fn draft_requires_a_name() {
        let err = RuleDraft::from_json(
            "  ",
            "",
            true,
            r#"{"groupJoiner":"AND","groups":[{"joiner":"AND","conditions":[{"field":"vendor","operator":"equals","value":"acme"}]}]}"#,
            r#"{"items":[{"type":"add","tags":["sale"]}]}"#,
        )
        .expect_err("blank name should be rejected");
        assert!(matches!(err, RuleError::NameRequired));
    }

    #[test]
    fn draft_rejects_malformed_json() {
        let err = RuleDraft::from_json("Sale", "", true, "{not json", "{}")
            .expect_err("malformed conditions should be rejected");
        assert!(matches!(err, RuleError::InvalidPayload("conditions")));
    }
}
