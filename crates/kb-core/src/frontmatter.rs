//! Front-matter codec: parses and serializes the
//! `---\n<key: value>*\n---\n<body>` file format that stores one item.
//!
//! Front matter is valid YAML (so quoted strings and JSON-like `[...]`
//! arrays parse for free via `serde_yaml`), but is always *written* in a
//! fixed key order for deterministic diffs rather than relying on whatever
//! order a generic YAML emitter would choose.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_yaml::Value;

use crate::error::Fault;
use crate::item::dedup_preserve_order;

const DELIMITER: &str = "---";

/// The canonical front-matter key order. `id`/`date` are mutually
/// exclusive depending on whether the item belongs to `dailies`.
pub const KEY_ORDER: &[&str] = &[
    "id",
    "date",
    "title",
    "description",
    "priority",
    "status",
    "tags",
    "start_date",
    "end_date",
    "related",
    "created_at",
    "updated_at",
];

/// Front matter as parsed off disk, before it has been matched against a
/// type's base kind. Field presence/absence is preserved so the caller
/// (the item repository) can apply base-kind validation itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrontMatter {
    pub id: Option<String>,
    pub date: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub related: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A parsed file: front matter plus the Markdown body that followed it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedFile {
    pub front_matter: RawFrontMatter,
    pub body: String,
}

/// Parses a complete file's contents into front matter and body.
///
/// Returns `CorruptItemFault` if the `---` delimiters are missing/unbalanced,
/// the YAML block fails to parse, or `title` is absent (the one front-matter
/// key required regardless of base kind).
pub fn parse(raw: &str, type_name: &str, id_hint: &str) -> Result<ParsedFile, Fault> {
    let corrupt = |reason: &str| Fault::corrupt_item(type_name, id_hint, reason.to_string());

    let rest = raw
        .strip_prefix(DELIMITER)
        .and_then(|s| s.strip_prefix('\n').or(Some(s)))
        .ok_or_else(|| corrupt("missing opening front-matter delimiter"))?;
    let end = rest
        .find("\n---")
        .ok_or_else(|| corrupt("missing closing front-matter delimiter"))?;
    let yaml_block = &rest[..end];
    let after_delim = &rest[end + 4..];
    let body = after_delim.strip_prefix('\n').unwrap_or(after_delim);

    let mapping: Value = if yaml_block.trim().is_empty() {
        Value::Mapping(Default::default())
    } else {
        serde_yaml::from_str(yaml_block).map_err(|e| corrupt(&format!("invalid YAML front matter: {e}")))?
    };
    let mapping = mapping
        .as_mapping()
        .ok_or_else(|| corrupt("front matter is not a mapping"))?;

    let get_str = |key: &str| -> Option<String> {
        mapping
            .get(Value::String(key.to_string()))
            .and_then(|v| v.as_str().map(str::to_string))
    };
    let get_str_list = |key: &str| -> Vec<String> {
        mapping
            .get(Value::String(key.to_string()))
            .and_then(|v| v.as_sequence())
            .map(|seq| {
                seq.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };

    let title = get_str("title").ok_or_else(|| corrupt("missing required key: title"))?;

    // Legacy aliases merge into `related`.
    let mut related = get_str_list("related");
    related.extend(get_str_list("related_tasks"));
    related.extend(get_str_list("related_documents"));

    let front_matter = RawFrontMatter {
        id: get_str("id"),
        date: get_str("date"),
        title: Some(title),
        description: get_str("description"),
        priority: get_str("priority"),
        status: get_str("status"),
        tags: dedup_preserve_order(get_str_list("tags")),
        start_date: get_str("start_date"),
        end_date: get_str("end_date"),
        related: dedup_preserve_order(related),
        created_at: get_str("created_at").and_then(|s| parse_timestamp(&s)),
        updated_at: get_str("updated_at").and_then(|s| parse_timestamp(&s)),
    };

    Ok(ParsedFile {
        front_matter,
        body: body.to_string(),
    })
}

/// A field to render, in canonical key order. `None` entries are omitted;
/// `is_daily` swaps the `id` key for `date`.
pub struct RenderFields<'a> {
    pub id: &'a str,
    pub is_daily: bool,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub status: Option<&'a str>,
    pub tags: &'a [String],
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    pub related: &'a [String],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: &'a str,
}

/// Renders a file in the canonical key order, escaping embedded quotes in
/// scalar values and emitting arrays in JSON-like `[...]` form.
pub fn render(fields: &RenderFields<'_>) -> String {
    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');

    if fields.is_daily {
        push_scalar(&mut out, "date", fields.id);
    } else {
        push_scalar(&mut out, "id", fields.id);
    }
    push_scalar(&mut out, "title", fields.title);
    if let Some(d) = fields.description {
        push_scalar(&mut out, "description", d);
    }
    if let Some(p) = fields.priority {
        push_scalar(&mut out, "priority", p);
    }
    if let Some(s) = fields.status {
        push_scalar(&mut out, "status", s);
    }
    if !fields.tags.is_empty() {
        push_array(&mut out, "tags", fields.tags);
    }
    if let Some(s) = fields.start_date {
        push_scalar(&mut out, "start_date", s);
    }
    if let Some(e) = fields.end_date {
        push_scalar(&mut out, "end_date", e);
    }
    if !fields.related.is_empty() {
        push_array(&mut out, "related", fields.related);
    }
    push_scalar(&mut out, "created_at", &format_timestamp(fields.created_at));
    push_scalar(&mut out, "updated_at", &format_timestamp(fields.updated_at));

    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(fields.body);
    out
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value.contains(':')
        || value.contains('"')
        || value.contains('\'')
        || value.contains('#')
        || value.starts_with(['[', '{', '-', '*', '&', '!', '|', '>', '%', '@', '`'])
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn push_scalar(out: &mut String, key: &str, value: &str) {
    if needs_quoting(value) {
        out.push_str(&format!("{key}: \"{}\"\n", escape_quoted(value)));
    } else {
        out.push_str(&format!("{key}: {value}\n"));
    }
}

fn push_array(out: &mut String, key: &str, values: &[String]) {
    let rendered: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", escape_quoted(v)))
        .collect();
    out.push_str(&format!("{key}: [{}]\n", rendered.join(", ")));
}

/// Formats a timestamp as ISO-8601 with millisecond precision.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an ISO-8601 timestamp, tolerating a couple of common variants
/// (missing sub-second precision, `Z` vs explicit offset).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_task_item() {
        let created = parse_timestamp("2025-07-24T10:00:00.000Z").unwrap();
        let fields = RenderFields {
            id: "1",
            is_daily: false,
            title: "Fix login",
            description: None,
            priority: Some("high"),
            status: Some("Open"),
            tags: &["bug".to_string(), "auth".to_string()],
            start_date: None,
            end_date: None,
            related: &[],
            created_at: created,
            updated_at: created,
            body: "details here",
        };
        let rendered = render(&fields);
        let parsed = parse(&rendered, "issues", "1").unwrap();
        assert_eq!(parsed.front_matter.title.as_deref(), Some("Fix login"));
        assert_eq!(parsed.front_matter.priority.as_deref(), Some("high"));
        assert_eq!(parsed.front_matter.status.as_deref(), Some("Open"));
        assert_eq!(parsed.front_matter.tags, vec!["bug", "auth"]);
        assert_eq!(parsed.body, "details here");
    }

    #[test]
    fn daily_uses_date_key_instead_of_id() {
        let now = Utc::now();
        let fields = RenderFields {
            id: "2025-07-24",
            is_daily: true,
            title: "Notes",
            description: None,
            priority: None,
            status: None,
            tags: &[],
            start_date: None,
            end_date: None,
            related: &[],
            created_at: now,
            updated_at: now,
            body: "",
        };
        let rendered = render(&fields);
        assert!(rendered.contains("date: 2025-07-24"));
        assert!(!rendered.contains("\nid:"));
        let parsed = parse(&rendered, "dailies", "2025-07-24").unwrap();
        assert_eq!(parsed.front_matter.date.as_deref(), Some("2025-07-24"));
    }

    #[test]
    fn legacy_aliases_merge_into_related() {
        let raw = "---\ntitle: Old\nrelated_tasks: [\"issues-1\"]\nrelated_documents: [\"docs-2\"]\n---\nbody";
        let parsed = parse(raw, "docs", "9").unwrap();
        assert_eq!(parsed.front_matter.related, vec!["issues-1", "docs-2"]);
    }

    #[test]
    fn missing_title_is_corrupt() {
        let raw = "---\nid: 1\n---\nbody";
        let err = parse(raw, "issues", "1").unwrap_err();
        assert!(matches!(err, Fault::CorruptItem { .. }));
    }

    #[test]
    fn missing_delimiters_is_corrupt() {
        let err = parse("not front matter at all", "issues", "1").unwrap_err();
        assert!(matches!(err, Fault::CorruptItem { .. }));
    }

    #[test]
    fn quoted_values_escape_embedded_quotes() {
        let now = Utc::now();
        let fields = RenderFields {
            id: "1",
            is_daily: false,
            title: "A \"quoted\" title",
            description: None,
            priority: None,
            status: None,
            tags: &[],
            start_date: None,
            end_date: None,
            related: &[],
            created_at: now,
            updated_at: now,
            body: "",
        };
        let rendered = render(&fields);
        let parsed = parse(&rendered, "docs", "1").unwrap();
        assert_eq!(parsed.front_matter.title.as_deref(), Some("A \"quoted\" title"));
    }
}
