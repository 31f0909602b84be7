//! `kb state` -- read or overwrite the singleton current-state artifact.

use anyhow::Result;

use kb_repo::CurrentStateStore;

use crate::cli::{StateArgs, StateCommand};
use crate::context::RuntimeContext;
use crate::output::{format_current_state, output_json};

pub fn run(ctx: &RuntimeContext, args: &StateArgs) -> Result<()> {
    let store = CurrentStateStore::new(ctx.engine.clone());
    match &args.command {
        StateCommand::Show => {
            let state = store.get()?;
            if ctx.json {
                output_json(&state);
            } else {
                println!("{}", format_current_state(&state));
            }
        }
        StateCommand::Set { content, related, tags, updated_by } => {
            let state = store.set(content.clone(), related.clone(), tags.clone(), updated_by.clone())?;
            if ctx.json {
                output_json(&state);
            } else {
                println!("current state updated");
                println!("{}", format_current_state(&state));
            }
        }
    }
    Ok(())
}
