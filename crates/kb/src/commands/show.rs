//! `kb show` -- display one item's full detail.

use anyhow::Result;

use kb_repo::ItemRepository;

use crate::cli::ShowArgs;
use crate::context::RuntimeContext;
use crate::output::{format_item_detail, output_json};

pub fn run(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    let repo = ItemRepository::new(ctx.engine.clone());
    let item = repo.get_item(&args.type_name, &args.id)?;

    if ctx.json {
        output_json(&item);
    } else {
        println!("{}", format_item_detail(&item));
    }
    Ok(())
}
