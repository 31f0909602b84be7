//! Output formatting helpers for the `kb` CLI.
//!
//! Every command prints either a human-readable rendering or, under
//! `--json`, the pretty-printed serialization of the same value.

use std::io::{self, Write};

use serde::Serialize;

use kb_core::item::{CurrentState, Hit, Item, ItemSummary, RebuildReport, Suggestion};
use kb_core::registry::{Status, Tag, TypeInfo};

/// Serializes `value` as pretty JSON to stdout.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let _ = writeln!(handle, "{json}");
        }
        Err(e) => {
            eprintln!("failed to serialize output: {e}");
        }
    }
}

pub fn format_item_detail(item: &Item) -> String {
    let mut out = format!("{}-{}: {}\n", item.type_name, item.id, item.title);
    if let Some(fields) = item.body.task_fields() {
        out.push_str(&format!("  status:   {}\n", fields.status));
        out.push_str(&format!("  priority: {}\n", fields.priority));
        if let Some(start) = &fields.start_date {
            out.push_str(&format!("  start:    {start}\n"));
        }
        if let Some(end) = &fields.end_date {
            out.push_str(&format!("  end:      {end}\n"));
        }
    }
    if let Some(desc) = &item.description {
        out.push_str(&format!("  description: {desc}\n"));
    }
    if !item.tags.is_empty() {
        out.push_str(&format!("  tags: {}\n", item.tags.join(", ")));
    }
    if !item.related.is_empty() {
        out.push_str(&format!("  related: {}\n", item.related.join(", ")));
    }
    out.push_str(&format!("  created: {}\n", item.created_at.to_rfc3339()));
    out.push_str(&format!("  updated: {}\n", item.updated_at.to_rfc3339()));
    if let Some(content) = &item.content {
        out.push('\n');
        out.push_str(content);
    }
    out
}

pub fn format_summary_row(summary: &ItemSummary) -> String {
    let status = summary.status.as_deref().unwrap_or("-");
    let priority = summary.priority.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "{}-{:<6} [{:<11}] {:<6} {}",
        summary.type_name, summary.id, status, priority, summary.title
    )
}

pub fn print_summaries(summaries: &[ItemSummary]) {
    if summaries.is_empty() {
        println!("(no items)");
        return;
    }
    for summary in summaries {
        println!("{}", format_summary_row(summary));
    }
}

pub fn print_tag_groups(groups: &std::collections::BTreeMap<String, Vec<ItemSummary>>) {
    if groups.values().all(|v| v.is_empty()) {
        println!("(no items)");
        return;
    }
    for (type_name, items) in groups {
        if items.is_empty() {
            continue;
        }
        println!("{type_name}:");
        for item in items {
            println!("  {}", format_summary_row(item));
        }
    }
}

pub fn format_hit_row(hit: &Hit) -> String {
    match &hit.snippet {
        Some(snippet) => format!("{}\n    {}", format_summary_row(&hit.summary), snippet),
        None => format_summary_row(&hit.summary),
    }
}

pub fn print_hits(hits: &[Hit]) {
    if hits.is_empty() {
        println!("(no items)");
        return;
    }
    for hit in hits {
        println!("{}", format_hit_row(hit));
    }
}

pub fn format_suggestion_row(suggestion: &Suggestion) -> String {
    format!("{}-{} {}", suggestion.type_name, suggestion.id, suggestion.title)
}

pub fn print_suggestions(suggestions: &[Suggestion]) {
    if suggestions.is_empty() {
        println!("(no matches)");
        return;
    }
    for suggestion in suggestions {
        println!("{}", format_suggestion_row(suggestion));
    }
}

pub fn format_tag_row(tag: &Tag) -> String {
    format!("{:<6} {}", tag.id, tag.name)
}

pub fn format_status_row(status: &Status) -> String {
    format!("{:<6} {:<16} closed={}", status.id, status.name, status.is_closed)
}

pub fn format_type_row(type_info: &TypeInfo) -> String {
    format!(
        "{:<12} {:<10} {}",
        type_info.name,
        type_info.base_kind,
        type_info.description.as_deref().unwrap_or("")
    )
}

pub fn format_current_state(state: &CurrentState) -> String {
    let mut out = String::new();
    if let Some(by) = &state.updated_by {
        out.push_str(&format!("updated by {by} at {}\n", state.updated_at.to_rfc3339()));
    } else {
        out.push_str(&format!("updated at {}\n", state.updated_at.to_rfc3339()));
    }
    if !state.tags.is_empty() {
        out.push_str(&format!("tags: {}\n", state.tags.join(", ")));
    }
    if !state.related.is_empty() {
        out.push_str(&format!("related: {}\n", state.related.join(", ")));
    }
    out.push('\n');
    out.push_str(&state.content);
    out
}

pub fn format_rebuild_report(report: &RebuildReport) -> String {
    let mut out = String::from("rebuild complete\n");
    for (type_name, count) in &report.per_type_counts {
        out.push_str(&format!("  {type_name}: {count} item(s)\n"));
    }
    if !report.dangling_references.is_empty() {
        out.push_str(&format!("  {} dangling reference(s):\n", report.dangling_references.len()));
        for reference in &report.dangling_references {
            out.push_str(&format!("    {reference}\n"));
        }
    }
    if !report.anomalies.is_empty() {
        out.push_str(&format!("  {} anomaly(ies):\n", report.anomalies.len()));
        for anomaly in &report.anomalies {
            out.push_str(&format!("    {anomaly}\n"));
        }
    }
    out
}
