//! Storage paths: computes canonical file locations for entities
//! under a data root, and enumerates the files of a type.

use std::path::{Path, PathBuf};

/// Computes the file path for an item, given its data root, type name, and
/// id. Callers are responsible for having already validated that `id`
/// matches the shape expected for `type_name`'s base kind.
pub fn item_path(data_root: &Path, type_name: &str, id: &str) -> PathBuf {
    match type_name {
        "sessions" => {
            let date = session_date_prefix(id).unwrap_or(id);
            data_root
                .join("sessions")
                .join(date)
                .join(format!("sessions-{id}.md"))
        }
        "dailies" => data_root
            .join("sessions")
            .join("dailies")
            .join(format!("dailies-{id}.md")),
        _ => data_root
            .join(type_name)
            .join(format!("{type_name}-{id}.md")),
    }
}

pub fn current_state_path(data_root: &Path) -> PathBuf {
    data_root.join("current_state.md")
}

/// The directory that holds all files of a regular (non-session) type.
pub fn type_dir(data_root: &Path, type_name: &str) -> PathBuf {
    match type_name {
        "sessions" => data_root.join("sessions"),
        "dailies" => data_root.join("sessions").join("dailies"),
        _ => data_root.join(type_name),
    }
}

/// Extracts the `YYYY-MM-DD` date prefix a session id starts with, used to
/// compute the date subdirectory a session file lives under.
fn session_date_prefix(session_id: &str) -> Option<&str> {
    session_id.get(0..10).filter(|s| crate::id::is_date(s))
}

/// Enumerates the `<type>-*.md` files for a type under the data root.
/// Non-matching names (the wrong prefix, or a suffix that is not `.md`)
/// are filtered out rather than erroring, since the directory may contain
/// editor swap files or other stray entries.
pub fn enumerate_type_files(data_root: &Path, type_name: &str) -> std::io::Result<Vec<PathBuf>> {
    let dir = type_dir(data_root, type_name);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let prefix = format!("{type_name}-");
    let mut out = Vec::new();
    for entry in walk_markdown_files(&dir)? {
        if let Some(file_name) = entry.file_name().and_then(|n| n.to_str()) {
            if file_name.starts_with(&prefix) && file_name.ends_with(".md") {
                out.push(entry);
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Recursively walks `dir` (sessions are nested one level deeper, under a
/// per-date subdirectory) collecting `.md` files.
fn walk_markdown_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk_markdown_files(&path)?);
        } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
            out.push(path);
        }
    }
    Ok(out)
}

/// Extracts the id portion of a `<type>-<id>.md` file name.
pub fn id_from_file_name(type_name: &str, file_name: &str) -> Option<String> {
    let prefix = format!("{type_name}-");
    let stem = file_name.strip_prefix(&prefix)?.strip_suffix(".md")?;
    Some(stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_item_path() {
        let root = Path::new("/root/kb");
        assert_eq!(
            item_path(root, "issues", "42"),
            Path::new("/root/kb/issues/issues-42.md")
        );
    }

    #[test]
    fn session_item_path_nests_by_date() {
        let root = Path::new("/root/kb");
        let path = item_path(root, "sessions", "2025-07-24-09.30.15.123");
        assert_eq!(
            path,
            Path::new("/root/kb/sessions/2025-07-24/sessions-2025-07-24-09.30.15.123.md")
        );
    }

    #[test]
    fn daily_item_path() {
        let root = Path::new("/root/kb");
        assert_eq!(
            item_path(root, "dailies", "2025-07-24"),
            Path::new("/root/kb/sessions/dailies/dailies-2025-07-24.md")
        );
    }

    #[test]
    fn current_state_path_is_fixed() {
        let root = Path::new("/root/kb");
        assert_eq!(current_state_path(root), Path::new("/root/kb/current_state.md"));
    }

    #[test]
    fn id_from_file_name_parses_regular_items() {
        assert_eq!(id_from_file_name("issues", "issues-42.md").as_deref(), Some("42"));
        assert_eq!(id_from_file_name("issues", "notes.md"), None);
    }

    #[test]
    fn enumerate_type_files_filters_non_matching_names() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("issues");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("issues-1.md"), "").unwrap();
        std::fs::write(dir.join("issues-2.md"), "").unwrap();
        std::fs::write(dir.join("README.md"), "").unwrap();
        std::fs::write(dir.join("issues-1.md.swp"), "").unwrap();

        let files = enumerate_type_files(tmp.path(), "issues").unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn enumerate_type_files_missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let files = enumerate_type_files(tmp.path(), "issues").unwrap();
        assert!(files.is_empty());
    }
}
