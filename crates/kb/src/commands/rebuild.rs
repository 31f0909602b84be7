//! `kb rebuild` -- drop and reconstruct the index from the Markdown tree.

use anyhow::Result;

use kb_repo::RebuildCoordinator;

use crate::cli::RebuildArgs;
use crate::context::RuntimeContext;
use crate::output::{format_rebuild_report, output_json};

pub fn run(ctx: &RuntimeContext, _args: &RebuildArgs) -> Result<()> {
    let coordinator = RebuildCoordinator::new(ctx.engine.clone());
    let report = coordinator.rebuild()?;

    if ctx.json {
        output_json(&report);
    } else {
        println!("{}", format_rebuild_report(&report));
    }
    Ok(())
}
