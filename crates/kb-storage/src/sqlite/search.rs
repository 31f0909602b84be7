//! Lowers the backend-independent boolean query AST (`kb_core::query::Expr`)
//! into SQLite `fts5` queries.
//!
//! `fts5` has no unary `NOT` and only allows one `MATCH` per `SELECT`
//! against a given virtual table, so each [`kb_core::query::Term`] becomes
//! its own `rowid IN (SELECT rowid FROM items_fts WHERE items_fts MATCH ?)`
//! subquery, and `AND`/`OR`/`NOT` combine those subqueries as ordinary SQL
//! boolean logic rather than as `fts5` query-syntax operators. Every term's
//! literal text is still passed through `fts5`'s own quoted-string syntax
//! (and column-filter syntax for a field prefix), so its tokenizer and
//! phrase matching are used natively, not reimplemented.

use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};

use kb_core::error::{Fault, Result};
use kb_core::query::{Expr, Term};

/// Wraps `text` as an `fts5` quoted string, doubling embedded quotes, so
/// user-supplied punctuation can never be read as an `fts5` operator.
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn term_match_string(term: &Term) -> String {
    let quoted = quote(&term.text);
    match term.field {
        Some(field) => format!("{}:{}", field.column_name(), quoted),
        None => quoted,
    }
}

/// Compiles `expr` into a SQL boolean expression over `items_fts.rowid`,
/// appending one bind parameter per term in left-to-right order.
fn compile(expr: &Expr, params: &mut Vec<String>) -> String {
    match expr {
        Expr::Term(term) => {
            params.push(term_match_string(term));
            "rowid IN (SELECT rowid FROM items_fts WHERE items_fts MATCH ?)".to_string()
        }
        Expr::Not(inner) => format!("NOT ({})", compile(inner, params)),
        Expr::And(left, right) => format!("({}) AND ({})", compile(left, params), compile(right, params)),
        Expr::Or(left, right) => format!("({}) OR ({})", compile(left, params), compile(right, params)),
    }
}

fn types_in_clause(types: Option<&[String]>, sql: &mut String, params: &mut Vec<Box<dyn ToSql>>) {
    if let Some(types) = types {
        if !types.is_empty() {
            let placeholders = vec!["?"; types.len()].join(", ");
            sql.push_str(&format!(" AND type_name IN ({placeholders})"));
            for t in types {
                params.push(Box::new(t.clone()));
            }
        }
    }
}

/// Runs a compiled query, optionally narrowed to a list of types and offset
/// within the result set, returning `(type_name, item_id)` pairs in
/// relevance order (`fts5`'s default `rank` ordering).
pub fn run(
    conn: &Connection,
    expr: &Expr,
    types: Option<&[String]>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<Vec<(String, String)>> {
    let mut term_params = Vec::new();
    let where_sql = compile(expr, &mut term_params);

    let mut sql = format!("SELECT type_name, item_id FROM items_fts WHERE {where_sql}");
    let mut params: Vec<Box<dyn ToSql>> = term_params.into_iter().map(|p| Box::new(p) as Box<dyn ToSql>).collect();
    types_in_clause(types, &mut sql, &mut params);
    sql.push_str(" ORDER BY rank");
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    } else if let Some(offset) = offset {
        // SQLite requires a LIMIT to use OFFSET; -1 means "no limit".
        sql.push_str(&format!(" LIMIT -1 OFFSET {offset}"));
    }

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Fault::storage(format!("failed to prepare search query: {e}")))?;
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(|e| Fault::storage(format!("failed to run search query: {e}")))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Fault::storage(format!("failed to scan search row: {e}")))?);
    }
    Ok(out)
}

/// Builds an excerpt around the matched span for one already-matched row,
/// using `fts5`'s own `snippet()` auxiliary function rather than
/// reimplementing span search. The row is re-selected by rowid and matched
/// again against the OR of the query's positive terms (terms beneath a
/// `NOT` can't have produced the match and are excluded), since `fts5`
/// computes the snippet relative to whatever `MATCH` expression ran
/// against that row. `max_tokens` approximates the "~64 chars" the snippet
/// is supposed to span; `fts5` budgets by token, not by character.
pub fn snippet_for(
    conn: &Connection,
    type_name: &str,
    item_id: &str,
    expr: &Expr,
    markers: (&str, &str),
) -> Result<Option<String>> {
    let positive = expr.positive_terms();
    if positive.is_empty() {
        return Ok(None);
    }
    let match_str = positive.iter().map(|t| term_match_string(t)).collect::<Vec<_>>().join(" OR ");

    conn.query_row(
        "SELECT snippet(items_fts, -1, ?1, ?2, '...', 10)
         FROM items_fts WHERE type_name = ?3 AND item_id = ?4 AND items_fts MATCH ?5",
        params![markers.0, markers.1, type_name, item_id, match_str],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(|e| Fault::storage(format!("failed to build snippet for {type_name}-{item_id}: {e}")))
}

/// Title-word-prefix autocomplete: items whose title contains a word
/// starting with `prefix`, optionally narrowed to a list of types.
pub fn suggest_titles(
    conn: &Connection,
    prefix: &str,
    types: Option<&[String]>,
    limit: i64,
) -> Result<Vec<(String, String, String)>> {
    // `fts5` prefix queries (`token*`) are bare tokens, not quoted strings,
    // so strip anything that would otherwise be read as query syntax.
    let cleaned: String = prefix.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect();
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }
    let match_str = format!("title:{cleaned}*");

    let mut sql = "SELECT type_name, item_id, title FROM items_fts WHERE items_fts MATCH ?".to_string();
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(match_str)];
    types_in_clause(types, &mut sql, &mut params);
    sql.push_str(" ORDER BY rank LIMIT ?");
    params.push(Box::new(limit));

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Fault::storage(format!("failed to prepare suggest query: {e}")))?;
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })
        .map_err(|e| Fault::storage(format!("failed to run suggest query: {e}")))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Fault::storage(format!("failed to scan suggest row: {e}")))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::items::{insert_item, upsert_fts, ItemRow};
    use crate::sqlite::store::SqliteStore;
    use chrono::Utc;

    fn seed(conn: &Connection, id: &str, title: &str, content: &str) {
        let now = Utc::now();
        insert_item(
            conn,
            &ItemRow {
                type_name: "issues".into(),
                id: id.into(),
                title: title.into(),
                description: None,
                content: Some(content.into()),
                priority: Some("high".into()),
                status: Some("Open".into()),
                start_date: None,
                end_date: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        upsert_fts(conn, "issues", id, title, None, Some(content), "").unwrap();
    }

    #[test]
    fn bare_term_matches_title_or_content() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed(conn, "1", "Fix login bug", "users cannot log in");
                seed(conn, "2", "Add dashboard", "new feature");
                let expr = kb_core::query::parse("login").unwrap();
                let hits = run(conn, &expr, None, None, None)?;
                assert_eq!(hits, vec![("issues".to_string(), "1".to_string())]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn not_excludes_matching_term() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed(conn, "1", "Fix login bug", "auth flow broken");
                seed(conn, "2", "Fix logout bug", "session cleanup");
                let expr = kb_core::query::parse("bug AND -login").unwrap();
                let hits = run(conn, &expr, None, None, None)?;
                assert_eq!(hits, vec![("issues".to_string(), "2".to_string())]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn field_prefix_narrows_to_one_column() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed(conn, "1", "login issue", "dashboard mentioned here");
                let expr = kb_core::query::parse("title:dashboard").unwrap();
                let hits = run(conn, &expr, None, None, None)?;
                assert!(hits.is_empty());
                let expr = kb_core::query::parse("content:dashboard").unwrap();
                let hits = run(conn, &expr, None, None, None)?;
                assert_eq!(hits.len(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn types_filter_narrows_to_listed_types() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed(conn, "1", "login issue", "body");
                let expr = kb_core::query::parse("login").unwrap();
                let hits = run(conn, &expr, Some(&["docs".to_string()]), None, None)?;
                assert!(hits.is_empty());
                let hits = run(conn, &expr, Some(&["issues".to_string()]), None, None)?;
                assert_eq!(hits.len(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn offset_skips_leading_results() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed(conn, "1", "login alpha", "body");
                seed(conn, "2", "login beta", "body");
                let expr = kb_core::query::parse("login").unwrap();
                let all = run(conn, &expr, None, None, None)?;
                assert_eq!(all.len(), 2);
                let skipped = run(conn, &expr, None, None, Some(1))?;
                assert_eq!(skipped.len(), 1);
                assert_eq!(skipped[0], all[1]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn snippet_highlights_matched_span() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed(conn, "1", "Fix login bug", "users cannot log in to the dashboard");
                let expr = kb_core::query::parse("login").unwrap();
                let snippet = snippet_for(conn, "issues", "1", &expr, ("**", "**"))?.unwrap();
                assert!(snippet.contains("**login**"), "unexpected snippet: {snippet}");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn suggest_titles_matches_word_prefix() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed(conn, "1", "Login page redesign", "body");
                seed(conn, "2", "Logout flow", "body");
                seed(conn, "3", "Dashboard update", "body");
                let hits = suggest_titles(conn, "log", None, 20)?;
                assert_eq!(hits.len(), 2);
                Ok(())
            })
            .unwrap();
    }
}
