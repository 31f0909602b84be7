//! `kb type` -- manage registered item types.

use anyhow::{anyhow, Result};

use kb_storage::sqlite::types;

use crate::cli::{TypeArgs, TypeCommand};
use crate::context::RuntimeContext;
use crate::output::{format_type_row, output_json};

pub fn run(ctx: &RuntimeContext, args: &TypeArgs) -> Result<()> {
    match &args.command {
        TypeCommand::List => {
            let all = ctx.engine.store.with_conn(types::list)?;
            if ctx.json {
                output_json(&all);
            } else {
                for type_info in &all {
                    println!("{}", format_type_row(type_info));
                }
            }
        }
        TypeCommand::Create { name, base_kind, description } => {
            let base_kind = base_kind.parse().map_err(|e: String| anyhow!(e))?;
            ctx.engine.store.with_conn(|conn| types::create(conn, name, base_kind, description.as_deref()))?;
            if ctx.json {
                output_json(&serde_json::json!({ "created": name }));
            } else {
                println!("created type '{name}'");
            }
        }
        TypeCommand::Delete { name } => {
            ctx.engine.store.with_conn(|conn| types::delete(conn, name))?;
            if ctx.json {
                output_json(&serde_json::json!({ "deleted": name }));
            } else {
                println!("deleted type '{name}'");
            }
        }
    }
    Ok(())
}
