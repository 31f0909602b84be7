//! The singleton current-state artifact: what the user is working on
//! right now, with its own tags and related references.
//!
//! Unlike an `Item`, current state has no title and no base kind, so it
//! does not go through `kb_core::frontmatter`'s item codec (which requires
//! `title`). It gets its own small front-matter format instead, following
//! the same `---`-delimited, fixed-key-order convention.

use chrono::Utc;
use serde_yaml::Value;

use kb_core::error::{Fault, Result};
use kb_core::frontmatter::{format_timestamp, parse_timestamp};
use kb_core::item::{dedup_preserve_order, CurrentState};
use kb_core::paths;
use kb_storage::sqlite::tags;

use crate::repo::{io_err, write_and_revert};
use crate::Context;

pub struct CurrentStateStore {
    ctx: Context,
}

impl CurrentStateStore {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Reads the current-state file, falling back to an empty state if one
    /// has never been written.
    pub fn get(&self) -> Result<CurrentState> {
        let path = paths::current_state_path(&self.ctx.data_root);
        match std::fs::read_to_string(&path) {
            Ok(raw) => parse(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CurrentState {
                content: String::new(),
                related: Vec::new(),
                tags: Vec::new(),
                updated_by: None,
                updated_at: self.ctx.clock.now(),
            }),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    /// Overwrites the current-state artifact. Referenced tags are interned
    /// (created if new); related references are checked for format only,
    /// matching the item repository's `related` validation.
    pub fn set(
        &self,
        content: String,
        related: Vec<String>,
        tags_in: Vec<String>,
        updated_by: Option<String>,
    ) -> Result<CurrentState> {
        let related = dedup_preserve_order(related);
        let tags_in = dedup_preserve_order(tags_in);
        for reference in &related {
            if kb_core::id::parse_reference(reference).is_none() {
                return Err(Fault::validation(format!("malformed reference: {reference}")));
            }
        }

        let state = CurrentState { content, related, tags: tags_in, updated_by, updated_at: self.ctx.clock.now() };
        let path = paths::current_state_path(&self.ctx.data_root);
        let previous = std::fs::read_to_string(&path).ok();
        let rendered = render(&state);

        self.ctx.store.run_in_transaction(|conn| {
            write_and_revert(&path, &rendered, previous.as_deref(), || {
                for tag in &state.tags {
                    tags::ensure(conn, tag)?;
                }
                kb_storage::sqlite::current_state::set(conn, &state)
            })?;
            Ok(state.clone())
        })
    }
}

fn render(state: &CurrentState) -> String {
    let mut out = String::from("---\n");
    if !state.related.is_empty() {
        out.push_str(&format!("related: [{}]\n", quoted_list(&state.related)));
    }
    if !state.tags.is_empty() {
        out.push_str(&format!("tags: [{}]\n", quoted_list(&state.tags)));
    }
    if let Some(by) = &state.updated_by {
        out.push_str(&format!("updated_by: \"{}\"\n", by.replace('\\', "\\\\").replace('"', "\\\"")));
    }
    out.push_str(&format!("updated_at: {}\n", format_timestamp(state.updated_at)));
    out.push_str("---\n");
    out.push_str(&state.content);
    out
}

fn quoted_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse(raw: &str) -> Result<CurrentState> {
    let corrupt = |reason: &str| Fault::corrupt_item("current_state", "current", reason.to_string());

    let rest = raw
        .strip_prefix("---")
        .and_then(|s| s.strip_prefix('\n').or(Some(s)))
        .ok_or_else(|| corrupt("missing opening front-matter delimiter"))?;
    let end = rest.find("\n---").ok_or_else(|| corrupt("missing closing front-matter delimiter"))?;
    let yaml_block = &rest[..end];
    let after_delim = &rest[end + 4..];
    let body = after_delim.strip_prefix('\n').unwrap_or(after_delim);

    let mapping: Value = if yaml_block.trim().is_empty() {
        Value::Mapping(Default::default())
    } else {
        serde_yaml::from_str(yaml_block).map_err(|e| corrupt(&format!("invalid YAML front matter: {e}")))?
    };
    let mapping = mapping.as_mapping().ok_or_else(|| corrupt("front matter is not a mapping"))?;

    let get_str = |key: &str| -> Option<String> {
        mapping.get(Value::String(key.to_string())).and_then(|v| v.as_str().map(str::to_string))
    };
    let get_str_list = |key: &str| -> Vec<String> {
        mapping
            .get(Value::String(key.to_string()))
            .and_then(|v| v.as_sequence())
            .map(|seq| seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    };

    Ok(CurrentState {
        content: body.to_string(),
        related: dedup_preserve_order(get_str_list("related")),
        tags: dedup_preserve_order(get_str_list("tags")),
        updated_by: get_str("updated_by"),
        updated_at: get_str("updated_at").and_then(|s| parse_timestamp(&s)).unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kb_storage::SqliteStore;
    use std::sync::Arc;

    fn store(tmp: &tempfile::TempDir) -> CurrentStateStore {
        let sqlite = SqliteStore::open_in_memory().unwrap();
        CurrentStateStore::new(Context::new(tmp.path(), sqlite))
    }

    #[test]
    fn get_before_any_write_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let state = store(&tmp).get().unwrap();
        assert_eq!(state.content, "");
        assert!(state.related.is_empty());
    }

    #[test]
    fn set_then_get_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let cs = store(&tmp);
        cs.set("working on login".into(), vec![], vec!["focus".into()], Some("agent".into())).unwrap();
        let got = cs.get().unwrap();
        assert_eq!(got.content, "working on login");
        assert_eq!(got.tags, vec!["focus".to_string()]);
        assert_eq!(got.updated_by.as_deref(), Some("agent"));
    }

    #[test]
    fn malformed_related_reference_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let cs = store(&tmp);
        let err = cs.set("x".into(), vec!["noiddash".into()], vec![], None).unwrap_err();
        assert!(matches!(err, Fault::Validation { .. }));
    }
}
