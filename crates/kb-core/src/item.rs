//! The item model, represented as a tagged union over base kind rather
//! than a single struct with kind-dependent fields left implicit as
//! `Option`s.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::enums::Priority;

/// Fields that exist only on `tasks`-kind items.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaskFields {
    pub status: String,
    pub priority: Priority,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// The base-kind-dependent portion of an item. `Plain` covers both
/// `documents` and `sessions` base kinds, which share the same (empty)
/// field shape and differ only in id format and storage path.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemBody {
    Task(TaskFields),
    Plain,
}

impl ItemBody {
    pub fn is_task(&self) -> bool {
        matches!(self, ItemBody::Task(_))
    }

    pub fn task_fields(&self) -> Option<&TaskFields> {
        match self {
            ItemBody::Task(fields) => Some(fields),
            ItemBody::Plain => None,
        }
    }
}

/// A fully-loaded item, as returned by `get_item_detail` and constructed by
/// `create_item`/`update_item`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub type_name: String,
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    /// Insertion-order, de-duplicated.
    pub tags: Vec<String>,
    /// Insertion-order, de-duplicated `type-id` reference strings.
    pub related: Vec<String>,
    pub body: ItemBody,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn reference(&self) -> String {
        format!("{}-{}", self.type_name, self.id)
    }

    pub fn summary(&self) -> ItemSummary {
        let fields = self.body.task_fields();
        ItemSummary {
            type_name: self.type_name.clone(),
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            related: self.related.clone(),
            status: fields.map(|f| f.status.clone()),
            priority: fields.map(|f| f.priority),
            start_date: fields.and_then(|f| f.start_date.clone()),
            end_date: fields.and_then(|f| f.end_date.clone()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A list-view projection of an item, excluding `content`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ItemSummary {
    pub type_name: String,
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub related: Vec<String>,
    pub status: Option<String>,
    pub priority: Option<Priority>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single full-text search result: a summary plus a highlighted excerpt
/// around the matched span, when one could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Hit {
    pub summary: ItemSummary,
    pub snippet: Option<String>,
}

/// A single autocomplete candidate from `suggest`: enough to disambiguate
/// which item a matched title belongs to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Suggestion {
    pub type_name: String,
    pub id: String,
    pub title: String,
}

/// Fields supplied to `create_item`. Unlike [`ItemPatch`], absence of an
/// optional field here means "use the default", not "leave unchanged" --
/// there is no prior state to leave unchanged.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub related: Vec<String>,
    /// Caller-supplied id, honored only for `sessions`/`dailies`.
    pub id: Option<String>,
}

/// A field-present-vs-absent patch for `update_item`. `Option<T>`
/// fields encode presence; `Option<Option<T>>` fields additionally encode
/// "set to null" (`Some(None)`) distinctly from "leave unchanged" (`None`).
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub content: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
    pub start_date: Option<Option<String>>,
    pub end_date: Option<Option<String>>,
    pub related: Option<Vec<String>>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.content.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.tags.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.related.is_none()
    }
}

/// The singleton current-state artifact.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CurrentState {
    pub content: String,
    pub related: Vec<String>,
    pub tags: Vec<String>,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Structured result of a `rebuild` call.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RebuildReport {
    pub per_type_counts: BTreeMap<String, usize>,
    pub dangling_references: Vec<String>,
    pub anomalies: Vec<String>,
}

/// Removes later duplicates from `items` while preserving first-occurrence
/// order.
pub fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_item() -> Item {
        Item {
            type_name: "issues".into(),
            id: "1".into(),
            title: "Fix login".into(),
            description: None,
            content: Some("body".into()),
            tags: vec!["bug".into(), "auth".into()],
            related: vec![],
            body: ItemBody::Task(TaskFields {
                status: "Open".into(),
                priority: Priority::High,
                start_date: None,
                end_date: None,
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn summary_excludes_content_and_carries_task_fields() {
        let item = task_item();
        let summary = item.summary();
        assert_eq!(summary.status.as_deref(), Some("Open"));
        assert_eq!(summary.priority, Some(Priority::High));
    }

    #[test]
    fn plain_items_have_no_task_fields_in_summary() {
        let mut item = task_item();
        item.body = ItemBody::Plain;
        let summary = item.summary();
        assert!(summary.status.is_none());
        assert!(summary.priority.is_none());
    }

    #[test]
    fn reference_is_type_dash_id() {
        assert_eq!(task_item().reference(), "issues-1");
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let input = vec!["a", "b", "a", "c", "b"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            dedup_preserve_order(input),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn empty_patch_is_empty() {
        assert!(ItemPatch::default().is_empty());
    }

    #[test]
    fn patch_with_only_nulling_field_is_not_empty() {
        let patch = ItemPatch {
            description: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
