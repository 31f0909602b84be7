//! `kb list` -- list item summaries for a type.

use anyhow::Result;

use kb_repo::repo::ListOptions;
use kb_repo::ItemRepository;

use crate::cli::ListArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_summaries};

pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let options = ListOptions {
        include_closed_statuses: args.include_closed,
        statuses: if args.statuses.is_empty() { None } else { Some(args.statuses.clone()) },
        start_date: args.start_date.clone(),
        end_date: args.end_date.clone(),
        limit: args.limit,
    };

    let repo = ItemRepository::new(ctx.engine.clone());
    let summaries = repo.list_items(&args.type_name, &options)?;

    if ctx.json {
        output_json(&summaries);
    } else {
        print_summaries(&summaries);
    }
    Ok(())
}
