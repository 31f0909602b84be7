//! The rebuild coordinator: reconstructs the entire index from the
//! file tree, which stays the authoritative source of truth at all times.

use std::collections::{BTreeMap, HashMap};

use kb_core::error::{Fault, Result};
use kb_core::item::RebuildReport;
use kb_storage::sqlite::{items, related, sequences, tags, types};

use crate::repo::{assemble_item, item_to_row};
use crate::Context;

pub struct RebuildCoordinator {
    ctx: Context,
}

impl RebuildCoordinator {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Walks every registered type's directory, re-parses every file, and
    /// replaces the index wholesale, then reports what it found.
    pub fn rebuild(&self) -> Result<RebuildReport> {
        tracing::info!("starting index rebuild");

        let type_infos = self.ctx.store.with_conn(|conn| types::list(conn))?;
        tracing::debug!(count = type_infos.len(), "loaded registered types");

        let mut parsed_items = Vec::new();
        let mut anomalies = Vec::new();
        let mut per_type_counts = BTreeMap::new();
        let mut max_numeric_id: HashMap<String, i64> = HashMap::new();

        for info in &type_infos {
            let files = kb_core::paths::enumerate_type_files(&self.ctx.data_root, &info.name)
                .map_err(|e| Fault::storage_retryable(format!("failed to enumerate {}: {e}", info.name)))?;
            tracing::debug!(type_name = %info.name, count = files.len(), "enumerated type files");

            let mut count = 0usize;
            for path in files {
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else { continue };
                let Some(id) = kb_core::paths::id_from_file_name(&info.name, file_name) else { continue };

                let raw = match std::fs::read_to_string(&path) {
                    Ok(raw) => raw,
                    Err(e) => {
                        anomalies.push(format!("{}: failed to read: {e}", path.display()));
                        continue;
                    }
                };
                let parsed = match kb_core::frontmatter::parse(&raw, &info.name, &id) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        anomalies.push(format!("{}-{}: {e}", info.name, id));
                        continue;
                    }
                };
                let item = match assemble_item(&info.name, &id, &parsed, info.base_kind) {
                    Ok(item) => item,
                    Err(e) => {
                        anomalies.push(format!("{}-{}: {e}", info.name, id));
                        continue;
                    }
                };
                if let Err(e) = kb_core::validation::validate(&item) {
                    anomalies.push(format!("{}-{}: {e}", info.name, id));
                    continue;
                }

                if kb_core::id::is_numeric_id(&id) {
                    if let Ok(numeric) = id.parse::<i64>() {
                        let entry = max_numeric_id.entry(info.name.clone()).or_insert(0);
                        if numeric > *entry {
                            *entry = numeric;
                        }
                    }
                }

                count += 1;
                parsed_items.push((info.name.clone(), id, item));
            }
            per_type_counts.insert(info.name.clone(), count);
        }
        tracing::info!(total = parsed_items.len(), anomalies = anomalies.len(), "parsed items for rebuild");

        self.ctx.store.run_in_transaction(|conn| {
            items::clear_all(conn)?;
            tracing::debug!("cleared index before rebuild");

            for (type_name, id, item) in &parsed_items {
                items::insert_item(conn, &item_to_row(item))?;
                tags::set_item_tags(conn, type_name, id, &item.tags)?;
                related::set_related(conn, type_name, id, &item.related)?;
                let tags_joined = item.tags.join(" ");
                items::upsert_fts(
                    conn,
                    type_name,
                    id,
                    &item.title,
                    item.description.as_deref(),
                    item.content.as_deref(),
                    &tags_joined,
                )?;
            }
            tracing::debug!("reinserted items into index");

            for info in &type_infos {
                let at_least = *max_numeric_id.get(&info.name).unwrap_or(&0);
                sequences::reconcile(conn, &info.name, at_least, info.base_kind)?;
            }
            tracing::debug!("reconciled sequences against files on disk");

            let mut dangling = Vec::new();
            for (type_name, id, item) in &parsed_items {
                for reference in &item.related {
                    if let Some((ref_type, ref_id)) = kb_core::id::parse_reference(reference) {
                        if items::get_item_row(conn, ref_type, ref_id).is_err() {
                            dangling.push(format!("{type_name}-{id} -> {reference}"));
                        }
                    }
                }
            }

            tracing::info!(dangling = dangling.len(), anomalies = anomalies.len(), "index rebuild complete");
            Ok(RebuildReport { per_type_counts: per_type_counts.clone(), dangling_references: dangling, anomalies: anomalies.clone() })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::ItemRepository;
    use kb_core::enums::Priority;
    use kb_core::item::NewItem;
    use kb_storage::SqliteStore;

    #[test]
    fn rebuild_restores_index_from_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(tmp.path().join("search.db")).unwrap();
        let ctx = Context::new(tmp.path(), store);
        let repo = ItemRepository::new(ctx.clone());

        repo.create_item(
            "issues",
            NewItem { title: "Fix login".into(), status: Some("Open".into()), priority: Some(Priority::High), ..Default::default() },
        )
        .unwrap();

        // Wipe the index but leave the files untouched.
        ctx.store.run_in_transaction(|conn| items::clear_all(conn)).unwrap();
        assert!(repo.list_items("issues", &Default::default()).unwrap().is_empty());

        let report = RebuildCoordinator::new(ctx).rebuild().unwrap();
        assert_eq!(report.per_type_counts.get("issues"), Some(&1));
        assert!(report.anomalies.is_empty());

        let restored = repo.list_items("issues", &Default::default()).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].title, "Fix login");
    }

    #[test]
    fn rebuild_reports_dangling_references() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(tmp.path().join("search.db")).unwrap();
        let ctx = Context::new(tmp.path(), store);
        let repo = ItemRepository::new(ctx.clone());

        repo.create_item(
            "issues",
            NewItem {
                title: "Fix login".into(),
                status: Some("Open".into()),
                priority: Some(Priority::High),
                related: vec!["docs-99".into()],
                ..Default::default()
            },
        )
        .unwrap();

        let report = RebuildCoordinator::new(ctx).rebuild().unwrap();
        assert_eq!(report.dangling_references, vec!["issues-1 -> docs-99".to_string()]);
    }
}
