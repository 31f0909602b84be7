//! `kb create` -- create a new item.

use anyhow::{anyhow, Result};

use kb_core::item::NewItem;
use kb_repo::ItemRepository;

use crate::cli::CreateArgs;
use crate::context::RuntimeContext;
use crate::output::{format_item_detail, output_json};

pub fn run(ctx: &RuntimeContext, args: &CreateArgs) -> Result<()> {
    let title = args
        .title
        .clone()
        .or_else(|| args.title_flag.clone())
        .ok_or_else(|| anyhow!("a title is required (positional argument or --title)"))?;

    let priority = match &args.priority {
        Some(p) => Some(p.parse().map_err(|e: String| anyhow!(e))?),
        None => None,
    };

    let new_item = NewItem {
        title,
        description: args.description.clone(),
        content: args.content.clone(),
        priority,
        status: args.status.clone(),
        tags: args.tags.clone(),
        start_date: args.start_date.clone(),
        end_date: args.end_date.clone(),
        related: args.related.clone(),
        id: args.id.clone(),
    };

    let repo = ItemRepository::new(ctx.engine.clone());
    let item = repo.create_item(&args.type_name, new_item)?;

    if ctx.json {
        output_json(&item);
    } else {
        println!("created {}", item.reference());
        println!("{}", format_item_detail(&item));
    }
    Ok(())
}
