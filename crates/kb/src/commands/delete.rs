//! `kb delete` -- delete an item.

use anyhow::Result;

use kb_repo::ItemRepository;

use crate::cli::DeleteArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &DeleteArgs) -> Result<()> {
    let repo = ItemRepository::new(ctx.engine.clone());
    repo.delete_item(&args.type_name, &args.id)?;

    if ctx.json {
        output_json(&serde_json::json!({ "deleted": format!("{}-{}", args.type_name, args.id) }));
    } else {
        println!("deleted {}-{}", args.type_name, args.id);
    }
    Ok(())
}
