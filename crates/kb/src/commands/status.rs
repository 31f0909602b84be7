//! `kb status` -- read-only access to the workflow status registry.

use anyhow::Result;

use kb_storage::sqlite::statuses;

use crate::cli::{StatusArgs, StatusCommand};
use crate::context::RuntimeContext;
use crate::output::{format_status_row, output_json};

pub fn run(ctx: &RuntimeContext, args: &StatusArgs) -> Result<()> {
    match &args.command {
        StatusCommand::List => {
            let all = ctx.engine.store.with_conn(statuses::list)?;
            if ctx.json {
                output_json(&all);
            } else {
                for status in &all {
                    println!("{}", format_status_row(status));
                }
            }
        }
    }
    Ok(())
}
