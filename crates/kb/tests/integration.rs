//! End-to-end CLI integration tests for the `kb` binary.
//!
//! Each test creates its own temporary directory, initializes a knowledge
//! base, and exercises the `kb` binary as a subprocess via `assert_cmd`,
//! asserting on `--json` output so tests don't depend on human-readable
//! formatting.

use assert_cmd::Command;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn kb() -> Command {
    Command::cargo_bin("kb").unwrap()
}

fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    kb().args(["init"]).current_dir(tmp.path()).assert().success();
    tmp
}

fn json(tmp: &TempDir, args: &[&str]) -> serde_json::Value {
    let mut full = args.to_vec();
    full.push("--json");
    let output = kb().args(&full).current_dir(tmp.path()).output().unwrap();
    assert!(output.status.success(), "{:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// Scenario 1: create / list / detail / update with closed-status exclusion
// ---------------------------------------------------------------------------

#[test]
fn create_list_detail_update_excludes_closed_by_default() {
    let tmp = init_project();

    let open = json(&tmp, &["create", "-t", "issues", "Fix login bug", "-p", "high", "-s", "Open"]);
    let closed = json(&tmp, &["create", "-t", "issues", "Old ticket", "-p", "low", "-s", "Closed"]);

    let open_id = open["id"].as_str().unwrap();
    let closed_id = closed["id"].as_str().unwrap();

    let listed = json(&tmp, &["list", "-t", "issues"]);
    let ids: Vec<&str> = listed.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&open_id));
    assert!(!ids.contains(&closed_id), "closed item should be excluded by default");

    let listed_all = json(&tmp, &["list", "-t", "issues", "--include-closed"]);
    let ids_all: Vec<&str> = listed_all.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ids_all.contains(&closed_id));

    let detail = json(&tmp, &["show", "-t", "issues", open_id]);
    assert_eq!(detail["title"], "Fix login bug");

    let updated = json(&tmp, &["update", "-t", "issues", open_id, "--status", "In Progress"]);
    assert_eq!(updated["body"]["status"], "In Progress");
}

// ---------------------------------------------------------------------------
// Scenario 2: tag search across types
// ---------------------------------------------------------------------------

#[test]
fn tag_search_finds_items_across_types() {
    let tmp = init_project();

    json(&tmp, &["create", "-t", "issues", "Login bug", "-p", "high", "-s", "Open", "--tag", "auth"]);
    json(&tmp, &["create", "-t", "docs", "Auth design", "--tag", "auth"]);
    json(&tmp, &["create", "-t", "issues", "Unrelated", "-p", "low", "-s", "Open"]);

    let hits = json(&tmp, &["tag", "items", "auth"]);
    let groups = hits.as_object().unwrap();
    assert_eq!(groups["issues"].as_array().unwrap()[0]["title"], "Login bug");
    assert_eq!(groups["docs"].as_array().unwrap()[0]["title"], "Auth design");

    let scoped = json(&tmp, &["tag", "items", "auth", "-t", "docs"]);
    let scoped_groups = scoped.as_object().unwrap();
    assert_eq!(scoped_groups.keys().collect::<Vec<_>>(), vec!["docs"]);
}

// ---------------------------------------------------------------------------
// Scenario 3: dailies uniqueness conflict
// ---------------------------------------------------------------------------

#[test]
fn dailies_reject_duplicate_dates() {
    let tmp = init_project();

    json(&tmp, &["create", "-t", "dailies", "Standup notes", "--id", "2026-07-31"]);

    let mut cmd = kb();
    cmd.args(["create", "-t", "dailies", "Duplicate", "--id", "2026-07-31"]).current_dir(tmp.path());
    cmd.assert().failure();
}

// ---------------------------------------------------------------------------
// Scenario 4: change type within a base kind rewrites inbound references
// ---------------------------------------------------------------------------

#[test]
fn move_rewrites_inbound_references() {
    let tmp = init_project();

    let target = json(&tmp, &["create", "-t", "issues", "Target", "-p", "medium", "-s", "Open"]);
    let target_id = target["id"].as_str().unwrap().to_string();
    let referrer = json(
        &tmp,
        &["create", "-t", "issues", "Referrer", "-p", "medium", "-s", "Open", "--related", &format!("issues-{target_id}")],
    );
    let referrer_id = referrer["id"].as_str().unwrap().to_string();

    let moved = json(&tmp, &["move", "--from-type", "issues", "--from-id", &target_id, "--to-type", "plans"]);
    let new_id = moved["to"].as_str().unwrap().rsplit('-').next().unwrap().to_string();

    let referrer_after = json(&tmp, &["show", "-t", "issues", &referrer_id]);
    let related: Vec<&str> = referrer_after["related"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
    assert!(related.contains(&format!("plans-{new_id}").as_str()));
    assert!(!related.contains(&format!("issues-{target_id}").as_str()));
}

// ---------------------------------------------------------------------------
// Scenario 5: rebuild from files after the index is deleted
// ---------------------------------------------------------------------------

#[test]
fn rebuild_reconstructs_index_from_files() {
    let tmp = init_project();

    json(&tmp, &["create", "-t", "issues", "Survives rebuild", "-p", "high", "-s", "Open"]);
    json(&tmp, &["create", "-t", "docs", "Doc survives"]);

    let index_path = tmp.path().join("search.db");
    assert!(index_path.exists());
    std::fs::remove_file(&index_path).unwrap();

    let report = json(&tmp, &["rebuild"]);
    let counts = report["per_type_counts"].as_object().unwrap();
    assert_eq!(counts["issues"].as_u64(), Some(1));
    assert_eq!(counts["docs"].as_u64(), Some(1));

    let listed = json(&tmp, &["list", "-t", "issues"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Scenario 6: boolean full-text precedence
// ---------------------------------------------------------------------------

#[test]
fn search_honors_boolean_precedence() {
    let tmp = init_project();

    json(&tmp, &["create", "-t", "issues", "login page crash", "-p", "high", "-s", "Open"]);
    json(&tmp, &["create", "-t", "issues", "login page fix", "-p", "high", "-s", "Open"]);
    json(&tmp, &["create", "-t", "issues", "logout redirect", "-p", "low", "-s", "Open"]);

    let hits = json(&tmp, &["search", "title:login AND -fix"]);
    let titles: Vec<&str> = hits.as_array().unwrap().iter().map(|h| h["summary"]["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["login page crash"]);

    let grouped = json(&tmp, &["search", "(login OR logout) AND NOT crash"]);
    let titles: Vec<&str> = grouped.as_array().unwrap().iter().map(|h| h["summary"]["title"].as_str().unwrap()).collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"login page fix"));
    assert!(titles.contains(&"logout redirect"));
}

// ---------------------------------------------------------------------------
// Additional coverage: registries and current state
// ---------------------------------------------------------------------------

#[test]
fn type_and_status_registries_are_seeded_and_extensible() {
    let tmp = init_project();

    let types = json(&tmp, &["type", "list"]);
    let names: Vec<&str> = types.as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"issues"));
    assert!(names.contains(&"dailies"));

    json(&tmp, &["type", "create", "specs", "--base-kind", "documents"]);
    let types_after = json(&tmp, &["type", "list"]);
    let names_after: Vec<&str> = types_after.as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert!(names_after.contains(&"specs"));

    let statuses = json(&tmp, &["status", "list"]);
    let status_names: Vec<&str> = statuses.as_array().unwrap().iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert!(status_names.contains(&"Open"));
    assert!(status_names.contains(&"Closed"));
}

#[test]
fn current_state_round_trips_through_the_cli() {
    let tmp = init_project();

    json(&tmp, &["state", "set", "working on login fix", "--tag", "focus"]);
    let state = json(&tmp, &["state", "show"]);
    assert_eq!(state["content"], "working on login fix");
    assert_eq!(state["tags"].as_array().unwrap().len(), 1);
}

#[test]
fn delete_removes_item_from_listing() {
    let tmp = init_project();

    let item = json(&tmp, &["create", "-t", "docs", "Scratch note"]);
    let id = item["id"].as_str().unwrap().to_string();

    json(&tmp, &["delete", "-t", "docs", &id]);

    let listed = json(&tmp, &["list", "-t", "docs"]);
    let ids: Vec<&str> = listed.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(!ids.contains(&id.as_str()));
}
