//! `kb search` -- boolean full-text search across items, or (with
//! `--suggest`) title-prefix autocomplete.

use anyhow::Result;

use kb_repo::SearchService;

use crate::cli::SearchArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_hits, print_suggestions};

pub fn run(ctx: &RuntimeContext, args: &SearchArgs) -> Result<()> {
    let search = SearchService::new(ctx.engine.clone());
    let types = (!args.types.is_empty()).then_some(args.types.as_slice());

    if args.suggest {
        let limit = args.limit.unwrap_or(20).max(0) as usize;
        let matches = search.suggest(&args.query, types, limit)?;
        if ctx.json {
            output_json(&matches);
        } else {
            print_suggestions(&matches);
        }
        return Ok(());
    }

    let hits = search.full_text(&args.query, types, args.limit, args.offset)?;
    if ctx.json {
        output_json(&hits);
    } else {
        print_hits(&hits);
    }
    Ok(())
}
