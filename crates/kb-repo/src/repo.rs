//! The item repository: the single mutation gateway joining the
//! front-matter codec, the index store, and the tag/type/status registries.
//!
//! Every mutating method here goes file-first, then index, inside one
//! `SqliteStore::run_in_transaction` call: the
//! file write happens while the write lock is held, and on any index
//! failure the file is reverted before the lock is released.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Timelike, Utc};
use rusqlite::Connection;

use kb_core::enums::{BaseKind, Priority};
use kb_core::error::{Fault, Result};
use kb_core::frontmatter::{self, RenderFields};
use kb_core::item::{dedup_preserve_order, Item, ItemBody, ItemPatch, ItemSummary, NewItem, TaskFields};
use kb_core::paths;
use kb_core::validation;
use kb_storage::sqlite::{items, related, sequences, statuses, tags, types};

use crate::Context;

pub struct ItemRepository {
    ctx: Context,
}

/// Filters accepted by [`ItemRepository::list_items`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub include_closed_statuses: bool,
    pub statuses: Option<Vec<String>>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

impl ItemRepository {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub fn create_item(&self, type_name: &str, new_item: NewItem) -> Result<Item> {
        let type_info = self.ctx.store.with_conn(|conn| types::get(conn, type_name))?;
        let is_tasks = type_info.base_kind == BaseKind::Tasks;
        validation::validate_new(&new_item, is_tasks)?;

        if is_tasks {
            let status = new_item.status.as_ref().expect("validated present for tasks-kind items");
            self.ensure_status_exists(status)?;
        }

        let tags_in = dedup_preserve_order(new_item.tags.clone());
        let related_in = dedup_preserve_order(new_item.related.clone());
        let now = self.ctx.clock.now();

        self.ctx.store.run_in_transaction(|conn| {
            let id = self.allocate_id(conn, type_name, &new_item)?;

            let body = if is_tasks {
                ItemBody::Task(TaskFields {
                    status: new_item.status.clone().expect("validated present"),
                    priority: new_item.priority.expect("validated present"),
                    start_date: new_item.start_date.clone(),
                    end_date: new_item.end_date.clone(),
                })
            } else {
                ItemBody::Plain
            };

            let item = Item {
                type_name: type_name.to_string(),
                id,
                title: new_item.title.clone(),
                description: new_item.description.clone(),
                content: new_item.content.clone(),
                tags: tags_in.clone(),
                related: related_in.clone(),
                body,
                created_at: now,
                updated_at: now,
            };
            validation::validate(&item)?;

            let path = paths::item_path(&self.ctx.data_root, type_name, &item.id);
            let rendered = render_item(&item, type_name == "dailies");
            write_and_revert(&path, &rendered, None, || self.persist_row(conn, &item))?;
            Ok(item)
        })
    }

    pub fn update_item(&self, type_name: &str, id: &str, patch: ItemPatch) -> Result<Item> {
        if patch.is_empty() {
            return self.get_item(type_name, id);
        }

        let type_info = self.ctx.store.with_conn(|conn| types::get(conn, type_name))?;
        let is_tasks = type_info.base_kind == BaseKind::Tasks;

        let current = self.get_item(type_name, id)?;
        let mut updated = current.clone();
        if let Some(title) = patch.title {
            updated.title = title;
        }
        if let Some(description) = patch.description {
            updated.description = description;
        }
        if let Some(content) = patch.content {
            updated.content = content;
        }
        if let Some(tags) = patch.tags {
            updated.tags = dedup_preserve_order(tags);
        }
        if let Some(related) = patch.related {
            updated.related = dedup_preserve_order(related);
        }

        match &mut updated.body {
            ItemBody::Task(fields) => {
                if let Some(status) = &patch.status {
                    fields.status = status.clone();
                }
                if let Some(priority) = patch.priority {
                    fields.priority = priority;
                }
                if let Some(start_date) = patch.start_date {
                    fields.start_date = start_date;
                }
                if let Some(end_date) = patch.end_date {
                    fields.end_date = end_date;
                }
            }
            ItemBody::Plain => {
                if patch.status.is_some() || patch.priority.is_some() || patch.start_date.is_some() || patch.end_date.is_some()
                {
                    return Err(Fault::validation(
                        "status/priority/start_date/end_date are forbidden for non-tasks-kind items",
                    ));
                }
            }
        }

        if is_tasks {
            if let Some(fields) = updated.body.task_fields() {
                self.ensure_status_exists(&fields.status)?;
            }
        }

        updated.updated_at = self.ctx.clock.now();
        validation::validate(&updated)?;

        let path = paths::item_path(&self.ctx.data_root, type_name, id);
        let previous_raw = read_to_string(&path)?;
        let rendered = render_item(&updated, type_name == "dailies");

        self.ctx.store.run_in_transaction(|conn| {
            write_and_revert(&path, &rendered, Some(&previous_raw), || {
                items::replace_item(conn, &item_to_row(&updated))?;
                tags::set_item_tags(conn, type_name, id, &updated.tags)?;
                related::set_related(conn, type_name, id, &updated.related)?;
                let tags_joined = updated.tags.join(" ");
                items::upsert_fts(
                    conn,
                    type_name,
                    id,
                    &updated.title,
                    updated.description.as_deref(),
                    updated.content.as_deref(),
                    &tags_joined,
                )?;
                Ok(())
            })?;
            Ok(updated.clone())
        })
    }

    pub fn delete_item(&self, type_name: &str, id: &str) -> Result<()> {
        let path = paths::item_path(&self.ctx.data_root, type_name, id);
        let previous_raw = read_to_string(&path)?;

        self.ctx.store.run_in_transaction(|conn| {
            std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
            let result: Result<()> = (|| {
                related::set_related(conn, type_name, id, &[])?;
                tags::set_item_tags(conn, type_name, id, &[])?;
                items::delete_fts(conn, type_name, id)?;
                items::delete_item(conn, type_name, id)?;
                Ok(())
            })();
            if let Err(e) = result {
                let _ = std::fs::write(&path, &previous_raw);
                return Err(e);
            }
            Ok(())
        })
    }

    /// Reads the file (authoritative), assembling a full [`Item`]. Logs a
    /// warning and prefers the file whenever the index row disagrees.
    pub fn get_item(&self, type_name: &str, id: &str) -> Result<Item> {
        let type_info = self.ctx.store.with_conn(|conn| types::get(conn, type_name))?;
        let item = self.load_item_from_file(type_name, id, type_info.base_kind)?;

        match self.ctx.store.with_conn(|conn| items::get_item_row(conn, type_name, id)) {
            Ok(row) => {
                if row.title != item.title || row.updated_at != item.updated_at {
                    tracing::warn!(type_name, id, "index row does not match item file; file wins");
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(type_name, id, "item file has no matching index row; file wins");
            }
            Err(e) => return Err(e),
        }

        Ok(item)
    }

    /// Lists summaries from the index only, never touching
    /// the file tree.
    pub fn list_items(&self, type_name: &str, options: &ListOptions) -> Result<Vec<ItemSummary>> {
        let is_sessions_like = matches!(type_name, "sessions" | "dailies");

        self.ctx.store.with_conn(|conn| {
            let type_info = types::get(conn, type_name)?;
            let is_tasks = type_info.base_kind == BaseKind::Tasks;
            let closed_statuses: HashSet<String> = if is_tasks {
                statuses::list(conn)?.into_iter().filter(|s| s.is_closed).map(|s| s.name).collect()
            } else {
                HashSet::new()
            };

            let rows = items::list_item_rows(
                conn,
                &items::ListFilter { type_name: Some(type_name), status: None, limit: None },
            )?;

            let mut summaries = Vec::new();
            for row in rows {
                if let Some(wanted) = &options.statuses {
                    let keep = row.status.as_ref().map(|s| wanted.contains(s)).unwrap_or(false);
                    if !keep {
                        continue;
                    }
                } else if is_tasks && !options.include_closed_statuses {
                    if row.status.as_ref().map(|s| closed_statuses.contains(s)).unwrap_or(false) {
                        continue;
                    }
                }

                let date_key: String = if is_sessions_like { row.id.clone() } else { format_date(row.updated_at) };
                if let Some(start) = &options.start_date {
                    if date_key.as_str() < start.as_str() {
                        continue;
                    }
                }
                if let Some(end) = &options.end_date {
                    if date_key.as_str() > end.as_str() {
                        continue;
                    }
                }

                let tags_list = tags::tags_for_item(conn, type_name, &row.id)?;
                let related_list = related::related_for_item(conn, type_name, &row.id)?;
                summaries.push(row_to_summary(row, tags_list, related_list));
            }

            sort_summaries(type_name, &mut summaries, options.limit.is_some());
            if let Some(limit) = options.limit {
                summaries.truncate(limit);
            }
            Ok(summaries)
        })
    }

    /// Moves an item to a different type of the same base kind, reassigning
    /// its id and rewriting every referrer's `related` list.
    pub fn change_type(&self, from_type: &str, from_id: &str, to_type: &str) -> Result<String> {
        let (from_info, to_info) = self.ctx.store.with_conn(|conn| {
            let from_info = types::get(conn, from_type)?;
            let to_info = types::get(conn, to_type)?;
            Ok((from_info, to_info))
        })?;
        if from_info.base_kind != to_info.base_kind {
            return Err(Fault::conflict("change_item_type requires types of the same base kind"));
        }
        if !kb_core::id::is_numeric_id(from_id) {
            return Err(Fault::validation("change_item_type only supports numeric-id types"));
        }

        let item = self.get_item(from_type, from_id)?;
        let from_path = paths::item_path(&self.ctx.data_root, from_type, from_id);

        self.ctx.store.run_in_transaction(|conn| {
            let new_id = sequences::next(conn, to_type)?.to_string();

            let mut moved = item.clone();
            moved.type_name = to_type.to_string();
            moved.id = new_id.clone();
            // Non-task destinations drop task-only fields (status/priority/dates).
            if to_info.base_kind != BaseKind::Tasks {
                moved.body = ItemBody::Plain;
            }
            moved.updated_at = self.ctx.clock.now();
            validation::validate(&moved)?;

            let new_path = paths::item_path(&self.ctx.data_root, to_type, &new_id);
            let rendered = render_item(&moved, to_type == "dailies");

            if let Some(parent) = new_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| io_err(&new_path, e))?;
            }
            std::fs::write(&new_path, &rendered).map_err(|e| io_err(&new_path, e))?;

            let result: Result<()> = (|| {
                self.persist_row(conn, &moved)?;
                related::retarget(conn, from_type, from_id, to_type, &new_id)?;
                items::delete_fts(conn, from_type, from_id)?;
                items::delete_item(conn, from_type, from_id)?;
                std::fs::remove_file(&from_path).map_err(|e| io_err(&from_path, e))?;
                Ok(())
            })();
            if let Err(e) = result {
                let _ = std::fs::remove_file(&new_path);
                return Err(e);
            }

            for referrer in related::referrers(conn, to_type, &new_id)? {
                if let Some((ref_type, ref_id)) = kb_core::id::parse_reference(&referrer) {
                    self.rewrite_related_reference(
                        conn,
                        ref_type,
                        ref_id,
                        &format!("{from_type}-{from_id}"),
                        &format!("{to_type}-{new_id}"),
                    )?;
                }
            }

            Ok(new_id)
        })
    }

    fn ensure_status_exists(&self, status: &str) -> Result<()> {
        let exists = self.ctx.store.with_conn(|conn| statuses::exists(conn, status))?;
        if !exists {
            return Err(Fault::not_found("status", status));
        }
        Ok(())
    }

    fn allocate_id(&self, conn: &Connection, type_name: &str, new_item: &NewItem) -> Result<String> {
        match type_name {
            "sessions" => match &new_item.id {
                Some(id) => {
                    if !kb_core::id::is_session_id(id) {
                        return Err(Fault::validation(format!("invalid session id: {id}")));
                    }
                    Ok(id.clone())
                }
                None => Ok(format_session_id(self.ctx.clock.now())),
            },
            "dailies" => {
                let date = new_item
                    .id
                    .clone()
                    .ok_or_else(|| Fault::validation("date is required for dailies items"))?;
                if !kb_core::id::is_date_id(&date) {
                    return Err(Fault::validation(format!("invalid date: {date}")));
                }
                match items::get_item_row(conn, "dailies", &date) {
                    Ok(_) => Err(Fault::conflict(format!("a daily entry for {date} already exists"))),
                    Err(e) if e.is_not_found() => Ok(date),
                    Err(e) => Err(e),
                }
            }
            _ => Ok(sequences::next(conn, type_name)?.to_string()),
        }
    }

    fn load_item_from_file(&self, type_name: &str, id: &str, base_kind: BaseKind) -> Result<Item> {
        let path = paths::item_path(&self.ctx.data_root, type_name, id);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Fault::not_found("item", format!("{type_name}-{id}"))
            } else {
                io_err(&path, e)
            }
        })?;
        let parsed = frontmatter::parse(&raw, type_name, id)?;
        assemble_item(type_name, id, &parsed, base_kind)
    }

    fn persist_row(&self, conn: &Connection, item: &Item) -> Result<()> {
        items::insert_item(conn, &item_to_row(item))?;
        tags::set_item_tags(conn, &item.type_name, &item.id, &item.tags)?;
        related::set_related(conn, &item.type_name, &item.id, &item.related)?;
        let tags_joined = item.tags.join(" ");
        items::upsert_fts(
            conn,
            &item.type_name,
            &item.id,
            &item.title,
            item.description.as_deref(),
            item.content.as_deref(),
            &tags_joined,
        )?;
        Ok(())
    }

    /// Rewrites one referring item's file and index row so its `related`
    /// list points at the new reference (`change_type`'s inbound-reference
    /// rewrite).
    fn rewrite_related_reference(
        &self,
        conn: &Connection,
        ref_type: &str,
        ref_id: &str,
        old_reference: &str,
        new_reference: &str,
    ) -> Result<()> {
        let type_info = types::get(conn, ref_type)?;
        let mut item = self.load_item_from_file(ref_type, ref_id, type_info.base_kind)?;
        let mut changed = false;
        for reference in item.related.iter_mut() {
            if reference == old_reference {
                *reference = new_reference.to_string();
                changed = true;
            }
        }
        if !changed {
            return Ok(());
        }
        item.updated_at = self.ctx.clock.now();

        let path = paths::item_path(&self.ctx.data_root, ref_type, ref_id);
        let previous_raw = read_to_string(&path)?;
        let rendered = render_item(&item, ref_type == "dailies");
        write_and_revert(&path, &rendered, Some(&previous_raw), || {
            related::set_related(conn, ref_type, ref_id, &item.related)
        })
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Fault::not_found("item", path.display().to_string())
        } else {
            io_err(path, e)
        }
    })
}

pub(crate) fn io_err(path: &Path, e: std::io::Error) -> Fault {
    Fault::storage_retryable(format!("filesystem error at {}: {e}", path.display()))
}

/// Writes `rendered` to `path` atomically (temp file + rename in the same
/// directory), then runs `op`. On failure, restores `previous` (or removes
/// the file if there was none), so a half-committed mutation never leaves
/// the file tree ahead of the index.
pub(crate) fn write_and_revert<T>(
    path: &Path,
    rendered: &str,
    previous: Option<&str>,
    op: impl FnOnce() -> Result<T>,
) -> Result<T> {
    write_atomic(path, rendered)?;
    match op() {
        Ok(value) => Ok(value),
        Err(e) => {
            match previous {
                Some(prev) => {
                    let _ = write_atomic(path, prev);
                }
                None => {
                    let _ = std::fs::remove_file(path);
                }
            }
            Err(e)
        }
    }
}

pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp_path = path.with_extension("md.tmp");
    std::fs::write(&tmp_path, contents).map_err(|e| io_err(&tmp_path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

fn render_item(item: &Item, is_daily: bool) -> String {
    let fields = item.body.task_fields();
    let rendered = RenderFields {
        id: &item.id,
        is_daily,
        title: &item.title,
        description: item.description.as_deref(),
        priority: fields.map(|f| f.priority.as_str()),
        status: fields.map(|f| f.status.as_str()),
        tags: &item.tags,
        start_date: fields.and_then(|f| f.start_date.as_deref()),
        end_date: fields.and_then(|f| f.end_date.as_deref()),
        related: &item.related,
        created_at: item.created_at,
        updated_at: item.updated_at,
        body: item.content.as_deref().unwrap_or(""),
    };
    frontmatter::render(&rendered)
}

pub(crate) fn assemble_item(type_name: &str, id: &str, parsed: &frontmatter::ParsedFile, base_kind: BaseKind) -> Result<Item> {
    let fm = &parsed.front_matter;
    let title = fm
        .title
        .clone()
        .ok_or_else(|| Fault::corrupt_item(type_name, id, "missing title"))?;

    let body = match base_kind {
        BaseKind::Tasks => {
            let status = fm
                .status
                .clone()
                .ok_or_else(|| Fault::corrupt_item(type_name, id, "missing status for tasks-kind item"))?;
            let priority = fm
                .priority
                .as_deref()
                .ok_or_else(|| Fault::corrupt_item(type_name, id, "missing priority for tasks-kind item"))?
                .parse::<Priority>()
                .map_err(|_| Fault::corrupt_item(type_name, id, "invalid priority"))?;
            ItemBody::Task(TaskFields { status, priority, start_date: fm.start_date.clone(), end_date: fm.end_date.clone() })
        }
        BaseKind::Documents | BaseKind::Sessions => ItemBody::Plain,
    };

    let created_at = fm
        .created_at
        .ok_or_else(|| Fault::corrupt_item(type_name, id, "missing created_at"))?;
    let updated_at = fm.updated_at.unwrap_or(created_at);
    let content = Some(parsed.body.clone()).filter(|b| !b.is_empty());

    Ok(Item {
        type_name: type_name.to_string(),
        id: id.to_string(),
        title,
        description: fm.description.clone(),
        content,
        tags: fm.tags.clone(),
        related: fm.related.clone(),
        body,
        created_at,
        updated_at,
    })
}

pub(crate) fn item_to_row(item: &Item) -> items::ItemRow {
    let fields = item.body.task_fields();
    items::ItemRow {
        type_name: item.type_name.clone(),
        id: item.id.clone(),
        title: item.title.clone(),
        description: item.description.clone(),
        content: item.content.clone(),
        priority: fields.map(|f| f.priority.as_str().to_string()),
        status: fields.map(|f| f.status.clone()),
        start_date: fields.and_then(|f| f.start_date.clone()),
        end_date: fields.and_then(|f| f.end_date.clone()),
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

pub(crate) fn row_to_summary(row: items::ItemRow, tags: Vec<String>, related: Vec<String>) -> ItemSummary {
    ItemSummary {
        type_name: row.type_name,
        id: row.id,
        title: row.title,
        description: row.description,
        tags,
        related,
        status: row.status,
        priority: row.priority.and_then(|p| p.parse().ok()),
        start_date: row.start_date,
        end_date: row.end_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Ascending by numeric id for regular types (descending if a limit is
/// present, per the source behavior preserved in the second open
/// question); `sessions` and `dailies` always sort descending by id.
fn sort_summaries(type_name: &str, summaries: &mut [ItemSummary], has_limit: bool) {
    match type_name {
        "sessions" | "dailies" => summaries.sort_by(|a, b| b.id.cmp(&a.id)),
        _ => {
            summaries.sort_by_key(|s| s.id.parse::<i64>().unwrap_or(0));
            if has_limit {
                summaries.reverse();
            }
        }
    }
}

fn format_date(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

fn format_session_id(dt: DateTime<Utc>) -> String {
    format!(
        "{}-{:02}.{:02}.{:02}.{:03}",
        dt.format("%Y-%m-%d"),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.timestamp_subsec_millis()
    )
}
