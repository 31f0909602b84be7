//! `kb update` -- update fields on an existing item.

use anyhow::{anyhow, bail, Result};

use kb_core::item::ItemPatch;
use kb_repo::ItemRepository;

use crate::cli::UpdateArgs;
use crate::context::RuntimeContext;
use crate::output::{format_item_detail, output_json};

pub fn run(ctx: &RuntimeContext, args: &UpdateArgs) -> Result<()> {
    let priority = match &args.priority {
        Some(p) => Some(p.parse().map_err(|e: String| anyhow!(e))?),
        None => None,
    };

    if args.clear_description && args.description.is_some() {
        bail!("--description and --clear-description are mutually exclusive");
    }
    if args.clear_content && args.content.is_some() {
        bail!("--content and --clear-content are mutually exclusive");
    }
    if args.clear_start_date && args.start_date.is_some() {
        bail!("--start-date and --clear-start-date are mutually exclusive");
    }
    if args.clear_end_date && args.end_date.is_some() {
        bail!("--end-date and --clear-end-date are mutually exclusive");
    }

    let patch = ItemPatch {
        title: args.title.clone(),
        description: if args.clear_description {
            Some(None)
        } else {
            args.description.clone().map(Some)
        },
        content: if args.clear_content { Some(None) } else { args.content.clone().map(Some) },
        priority,
        status: args.status.clone(),
        tags: if args.tags.is_empty() { None } else { Some(args.tags.clone()) },
        start_date: if args.clear_start_date {
            Some(None)
        } else {
            args.start_date.clone().map(Some)
        },
        end_date: if args.clear_end_date { Some(None) } else { args.end_date.clone().map(Some) },
        related: if args.related.is_empty() { None } else { Some(args.related.clone()) },
    };

    if patch.is_empty() {
        bail!("no fields to update");
    }

    let repo = ItemRepository::new(ctx.engine.clone());
    let item = repo.update_item(&args.type_name, &args.id, patch)?;

    if ctx.json {
        output_json(&item);
    } else {
        println!("updated {}", item.reference());
        println!("{}", format_item_detail(&item));
    }
    Ok(())
}
