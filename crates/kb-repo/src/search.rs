//! Search orchestration: full-text queries, tag lookups, title-prefix
//! suggestions, and related-item traversal, all assembled into
//! [`kb_core::item::ItemSummary`] rows from the index.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use rusqlite::Connection;

use kb_core::enums::BaseKind;
use kb_core::error::Result;
use kb_core::item::{Hit, ItemSummary, Suggestion};
use kb_storage::sqlite::{items, related, search, statuses, tags, types};

use crate::repo::row_to_summary;
use crate::Context;

const DEFAULT_SNIPPET_MARKERS: (&str, &str) = ("**", "**");

pub struct SearchService {
    ctx: Context,
}

impl SearchService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Runs a boolean full-text query, narrowing to a list of types and/or
    /// a result window when given. Each hit carries a highlighted excerpt
    /// around the matched span.
    pub fn full_text(
        &self,
        query: &str,
        types: Option<&[String]>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Hit>> {
        let expr = kb_core::query::parse(query)?;
        self.ctx.store.with_conn(|conn| {
            let hits = search::run(conn, &expr, types, limit, offset)?;
            let mut out = Vec::with_capacity(hits.len());
            for (type_name, id) in hits {
                let summary = load_summary(conn, &type_name, &id)?;
                let snippet = search::snippet_for(conn, &type_name, &id, &expr, DEFAULT_SNIPPET_MARKERS)?;
                out.push(Hit { summary, snippet });
            }
            Ok(out)
        })
    }

    /// Lists every item carrying `tag`, grouped by type, optionally
    /// narrowed to a list of types. `tasks`-kind items in a closed status
    /// are excluded by default, matching `list_items`.
    pub fn by_tag(&self, tag: &str, types: Option<&[String]>) -> Result<BTreeMap<String, Vec<ItemSummary>>> {
        self.ctx.store.with_conn(|conn| {
            let closed_statuses: HashSet<String> =
                statuses::list(conn)?.into_iter().filter(|s| s.is_closed).map(|s| s.name).collect();

            let mut base_kinds: HashMap<String, BaseKind> = HashMap::new();

            let mut grouped: BTreeMap<String, Vec<ItemSummary>> = BTreeMap::new();
            for (type_name, id) in items_tagged(conn, tag, types)? {
                let row = items::get_item_row(conn, &type_name, &id)?;

                let base_kind = match base_kinds.get(&type_name) {
                    Some(kind) => *kind,
                    None => {
                        let kind = types::get(conn, &type_name)?.base_kind;
                        base_kinds.insert(type_name.clone(), kind);
                        kind
                    }
                };
                if base_kind == BaseKind::Tasks && row.status.as_ref().map(|s| closed_statuses.contains(s)).unwrap_or(false) {
                    continue;
                }

                let tag_list = tags::tags_for_item(conn, &type_name, &id)?;
                let related_list = related::related_for_item(conn, &type_name, &id)?;
                grouped.entry(type_name.clone()).or_default().push(row_to_summary(row, tag_list, related_list));
            }
            Ok(grouped)
        })
    }

    /// Top-N item titles whose words begin with `prefix`, optionally
    /// narrowed to a list of types. Capped at 20 results regardless of the
    /// caller's request.
    pub fn suggest(&self, prefix: &str, types: Option<&[String]>, limit: usize) -> Result<Vec<Suggestion>> {
        let capped = limit.min(20) as i64;
        self.ctx.store.with_conn(|conn| {
            let rows = search::suggest_titles(conn, prefix, types, capped)?;
            Ok(rows.into_iter().map(|(type_name, id, title)| Suggestion { type_name, id, title }).collect())
        })
    }

    /// Breadth-first walk of `related_items` starting at `type_name-id`, up
    /// to `depth` hops, excluding the starting item itself.
    pub fn related_files(&self, type_name: &str, id: &str, depth: usize) -> Result<Vec<ItemSummary>> {
        self.ctx.store.with_conn(|conn| {
            let start = format!("{type_name}-{id}");
            let mut visited: HashSet<String> = HashSet::from([start.clone()]);
            let mut frontier = VecDeque::from([(type_name.to_string(), id.to_string(), 0usize)]);
            let mut found = Vec::new();

            while let Some((cur_type, cur_id, cur_depth)) = frontier.pop_front() {
                if cur_depth >= depth {
                    continue;
                }
                for reference in related::related_for_item(conn, &cur_type, &cur_id)? {
                    if visited.insert(reference.clone()) {
                        if let Some((ref_type, ref_id)) = kb_core::id::parse_reference(&reference) {
                            found.push((ref_type.to_string(), ref_id.to_string()));
                            frontier.push_back((ref_type.to_string(), ref_id.to_string(), cur_depth + 1));
                        }
                    }
                }
            }

            assemble(conn, found)
        })
    }
}

fn load_summary(conn: &Connection, type_name: &str, id: &str) -> Result<ItemSummary> {
    let row = items::get_item_row(conn, type_name, id)?;
    let tag_list = tags::tags_for_item(conn, type_name, id)?;
    let related_list = related::related_for_item(conn, type_name, id)?;
    Ok(row_to_summary(row, tag_list, related_list))
}

fn items_tagged(conn: &Connection, tag: &str, types: Option<&[String]>) -> Result<Vec<(String, String)>> {
    let mut sql = "SELECT item_tags.type, item_tags.id FROM item_tags
             JOIN tags ON tags.id = item_tags.tag_id
             WHERE tags.name = ?1"
        .to_string();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(tag.to_string())];
    if let Some(types) = types {
        if !types.is_empty() {
            let placeholders = vec!["?"; types.len()].join(", ");
            sql.push_str(&format!(" AND item_tags.type IN ({placeholders})"));
            for t in types {
                params.push(Box::new(t.clone()));
            }
        }
    }
    sql.push_str(" ORDER BY item_tags.type, item_tags.id");

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| kb_core::error::Fault::storage(format!("failed to prepare tag lookup: {e}")))?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), scan_pair)
        .map_err(|e| kb_core::error::Fault::storage(format!("failed to run tag lookup: {e}")))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| kb_core::error::Fault::storage(format!("failed to scan tag lookup row: {e}")))?);
    }
    Ok(out)
}

fn scan_pair(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn assemble(conn: &Connection, hits: Vec<(String, String)>) -> Result<Vec<ItemSummary>> {
    let mut out = Vec::new();
    for (type_name, id) in hits {
        out.push(load_summary(conn, &type_name, &id)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::ItemRepository;
    use kb_core::enums::Priority;
    use kb_core::item::NewItem;
    use kb_storage::SqliteStore;

    fn services(tmp: &tempfile::TempDir) -> (ItemRepository, SearchService) {
        let store = SqliteStore::open(tmp.path().join("search.db")).unwrap();
        let ctx = Context::new(tmp.path(), store);
        (ItemRepository::new(ctx.clone()), SearchService::new(ctx))
    }

    fn issue(title: &str, tags: Vec<String>) -> NewItem {
        NewItem { title: title.into(), status: Some("Open".into()), priority: Some(Priority::High), tags, ..Default::default() }
    }

    #[test]
    fn full_text_finds_title_match_with_snippet() {
        let tmp = tempfile::tempdir().unwrap();
        let (repo, search) = services(&tmp);
        repo.create_item("issues", issue("Fix login bug", vec![])).unwrap();
        repo.create_item("issues", issue("Add dashboard", vec![])).unwrap();
        let hits = search.full_text("login", None, None, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].summary.title, "Fix login bug");
        assert!(hits[0].snippet.as_deref().unwrap_or("").contains("**login**"));
    }

    #[test]
    fn full_text_offset_skips_leading_results() {
        let tmp = tempfile::tempdir().unwrap();
        let (repo, search) = services(&tmp);
        repo.create_item("issues", issue("login alpha", vec![])).unwrap();
        repo.create_item("issues", issue("login beta", vec![])).unwrap();
        let all = search.full_text("login", None, None, None).unwrap();
        assert_eq!(all.len(), 2);
        let rest = search.full_text("login", None, None, Some(1)).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].summary.id, all[1].summary.id);
    }

    #[test]
    fn by_tag_filters_to_matching_items_and_groups_by_type() {
        let tmp = tempfile::tempdir().unwrap();
        let (repo, search) = services(&tmp);
        repo.create_item("issues", issue("A", vec!["bug".into()])).unwrap();
        repo.create_item("issues", issue("B", vec!["feature".into()])).unwrap();
        repo.create_item("docs", NewItem { title: "Doc A".into(), tags: vec!["bug".into()], ..Default::default() }).unwrap();
        let hits = search.by_tag("bug", None).unwrap();
        assert_eq!(hits.keys().collect::<Vec<_>>(), vec!["docs", "issues"]);
        assert_eq!(hits["issues"].len(), 1);
        assert_eq!(hits["docs"].len(), 1);
    }

    #[test]
    fn by_tag_excludes_closed_tasks_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let (repo, search) = services(&tmp);
        repo.create_item("issues", issue("Open one", vec!["bug".into()])).unwrap();
        let closed = NewItem { status: Some("Closed".into()), ..issue("Closed one", vec!["bug".into()]) };
        repo.create_item("issues", closed).unwrap();
        let hits = search.by_tag("bug", None).unwrap();
        assert_eq!(hits["issues"].len(), 1);
        assert_eq!(hits["issues"][0].title, "Open one");
    }

    #[test]
    fn by_tag_narrows_to_requested_types() {
        let tmp = tempfile::tempdir().unwrap();
        let (repo, search) = services(&tmp);
        repo.create_item("issues", issue("A", vec!["bug".into()])).unwrap();
        repo.create_item("docs", NewItem { title: "Doc A".into(), tags: vec!["bug".into()], ..Default::default() }).unwrap();
        let hits = search.by_tag("bug", Some(&["docs".to_string()])).unwrap();
        assert_eq!(hits.keys().collect::<Vec<_>>(), vec!["docs"]);
    }

    #[test]
    fn suggest_matches_title_word_prefix_and_caps_at_twenty() {
        let tmp = tempfile::tempdir().unwrap();
        let (repo, search) = services(&tmp);
        for i in 0..25 {
            repo.create_item("issues", issue(&format!("login item {i}"), vec![])).unwrap();
        }
        repo.create_item("issues", issue("unrelated", vec![])).unwrap();
        let hits = search.suggest("log", None, 100).unwrap();
        assert_eq!(hits.len(), 20);
        assert!(hits.iter().all(|s| s.title.starts_with("login")));
    }

    #[test]
    fn related_files_walks_one_hop() {
        let tmp = tempfile::tempdir().unwrap();
        let (repo, search) = services(&tmp);
        repo.create_item("docs", NewItem { title: "Doc".into(), ..Default::default() }).unwrap();
        repo.create_item("issues", issue("Issue", vec![])).unwrap();
        repo.update_item(
            "issues",
            "1",
            kb_core::item::ItemPatch { related: Some(vec!["docs-1".into()]), ..Default::default() },
        )
        .unwrap();

        let hits = search.related_files("issues", "1", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Doc");
    }
}
