use serde::de::{Deserializer, IgnoredAny};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Splits comma-separated tag text into trimmed, non-empty tags.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether an action adds or removes its tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Add,
    Remove,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Add => "add",
            ActionKind::Remove => "remove",
        }
    }
}

impl Default for ActionKind {
    fn default() -> Self {
        ActionKind::Add
    }
}

impl Serialize for ActionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Persisted payloads treat anything that is not "remove" as add.
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == "remove" {
            ActionKind::Remove
        } else {
            ActionKind::Add
        })
    }
}

/// One tag action: add or remove a set of tags when the rule matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagAction {
    #[serde(rename = "type", default)]
    pub kind: ActionKind,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TagAction {
    pub fn add(tags: Vec<String>) -> Self {
        Self {
            kind: ActionKind::Add,
            tags,
        }
    }

    pub fn remove(tags: Vec<String>) -> Self {
        Self {
            kind: ActionKind::Remove,
            tags,
        }
    }

    /// Builds an action from comma-separated tag text.
    pub fn from_text(kind: ActionKind, text: &str) -> Self {
        Self {
            kind,
            tags: split_tags(text),
        }
    }
}

/// A rule's action list.
///
/// Deserialization normalizes the legacy `addTags`/`removeTags` shape
/// into items once, so the evaluator only ever sees the item form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ActionsPayload")]
pub struct RuleActions {
    pub items: Vec<TagAction>,
}

impl RuleActions {
    /// Normalized add/remove tag lists: each tag trimmed, blanks
    /// dropped, item order preserved.
    pub fn add_remove_tags(&self) -> (Vec<String>, Vec<String>) {
        let mut add_tags = Vec::new();
        let mut remove_tags = Vec::new();

        for item in &self.items {
            let tags = item
                .tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string);

            match item.kind {
                ActionKind::Remove => remove_tags.extend(tags),
                ActionKind::Add => add_tags.extend(tags),
            }
        }

        (add_tags, remove_tags)
    }

    /// Total number of tags across all items.
    pub fn tag_count(&self) -> usize {
        self.items.iter().map(|item| item.tags.len()).sum()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionsPayload {
    Items {
        items: Vec<TagAction>,
    },
    Legacy {
        #[serde(default, rename = "addTags")]
        add_tags: Vec<String>,
        #[serde(default, rename = "removeTags")]
        remove_tags: Vec<String>,
    },
    Other(IgnoredAny),
}

impl From<ActionsPayload> for RuleActions {
    fn from(payload: ActionsPayload) -> Self {
        match payload {
            ActionsPayload::Items { items } => Self { items },
            ActionsPayload::Legacy {
                add_tags,
                remove_tags,
            } => {
                let mut items = Vec::new();
                if !add_tags.is_empty() {
                    items.push(TagAction::add(add_tags));
                }
                if !remove_tags.is_empty() {
                    items.push(TagAction::remove(remove_tags));
                }
                Self { items }
            }
            ActionsPayload::Other(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_tag_text() {
        assert_eq!(
            split_tags(" sale , new ,, featured "),
            vec!["sale".to_string(), "new".to_string(), "featured".to_string()]
        );
        assert!(split_tags("  ,  ").is_empty());
    }

    #[test]
    fn legacy_add_remove_arrays_become_items() {
        let actions: RuleActions =
            serde_json::from_str(r#"{"addTags":["sale"],"removeTags":["archived"]}"#)
                .expect("legacy payload should deserialize");

        assert_eq!(actions.items.len(), 2);
        let (add, remove) = actions.add_remove_tags();
        assert_eq!(add, vec!["sale".to_string()]);
        assert_eq!(remove, vec!["archived".to_string()]);
    }

    #[test]
    fn unknown_action_kinds_default_to_add() {
        let actions: RuleActions =
            serde_json::from_str(r#"{"items":[{"type":"toggle","tags":["sale"]}]}"#)
                .expect("payload should deserialize");

        assert_eq!(actions.items[0].kind, ActionKind::Add);
    }

    #[test]
    fn blank_tags_are_dropped_from_the_tag_lists() {
        let actions = RuleActions {
            items: vec![TagAction::add(vec![" sale ".into(), "  ".into()])],
        };
        let (add, remove) = actions.add_remove_tags();
        assert_eq!(add, vec!["sale".to_string()]);
        assert!(remove.is_empty());
    }

    #[test]
    fn unrecognizable_payload_normalizes_to_no_items() {
        let actions: RuleActions =
            serde_json::from_str("null").expect("null payload should deserialize");
        assert!(actions.items.is_empty());
    }
}
