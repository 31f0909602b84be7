//! `kb move` -- move an item to a different type of the same base kind.

use anyhow::Result;

use kb_repo::ItemRepository;

use crate::cli::MoveArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &MoveArgs) -> Result<()> {
    let repo = ItemRepository::new(ctx.engine.clone());
    let new_id = repo.change_type(&args.from_type, &args.from_id, &args.to_type)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "from": format!("{}-{}", args.from_type, args.from_id),
            "to": format!("{}-{}", args.to_type, new_id),
        }));
    } else {
        println!("moved {}-{} to {}-{}", args.from_type, args.from_id, args.to_type, new_id);
    }
    Ok(())
}
