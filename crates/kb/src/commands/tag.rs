//! `kb tag` -- manage tags and tag-filtered search.

use anyhow::Result;

use kb_repo::SearchService;
use kb_storage::sqlite::tags;

use crate::cli::{TagArgs, TagCommand};
use crate::context::RuntimeContext;
use crate::output::{format_tag_row, output_json, print_tag_groups};

pub fn run(ctx: &RuntimeContext, args: &TagArgs) -> Result<()> {
    match &args.command {
        TagCommand::List => {
            let all = ctx.engine.store.with_conn(|conn| tags::search(conn, ""))?;
            if ctx.json {
                output_json(&all);
            } else {
                for tag in &all {
                    println!("{}", format_tag_row(tag));
                }
            }
        }
        TagCommand::Create { name } => {
            ctx.engine.store.with_conn(|conn| tags::ensure(conn, name))?;
            if ctx.json {
                output_json(&serde_json::json!({ "created": name }));
            } else {
                println!("created tag '{name}'");
            }
        }
        TagCommand::Delete { name, force } => {
            ctx.engine.store.with_conn(|conn| tags::delete(conn, name, *force))?;
            if ctx.json {
                output_json(&serde_json::json!({ "deleted": name }));
            } else {
                println!("deleted tag '{name}'");
            }
        }
        TagCommand::Search { prefix, limit } => {
            let matches = ctx.engine.store.with_conn(|conn| tags::search(conn, prefix))?;
            let matches: Vec<_> = matches.into_iter().take(*limit).collect();
            if ctx.json {
                output_json(&matches);
            } else {
                for tag in &matches {
                    println!("{}", format_tag_row(tag));
                }
            }
        }
        TagCommand::Items { name, types } => {
            let search = SearchService::new(ctx.engine.clone());
            let type_filter = (!types.is_empty()).then_some(types.as_slice());
            let hits = search.by_tag(name, type_filter)?;
            if ctx.json {
                output_json(&hits);
            } else {
                print_tag_groups(&hits);
            }
        }
    }
    Ok(())
}
