//! `kb` -- local knowledge-base engine CLI.
//!
//! Parses arguments with clap, resolves configuration and opens the index
//! via [`context::RuntimeContext`], and dispatches to one handler per
//! operation group. No business logic beyond argument parsing and output
//! formatting lives here; every behavior is implemented by `kb-repo`.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

fn main() {
    let cli = Cli::parse();

    if cli.global.verbose {
        tracing_subscriber::fmt().with_env_filter("kb=debug").with_writer(std::io::stderr).init();
    }

    let result = match &cli.command {
        Some(Commands::Init(args)) => commands::init::run(&cli.global, args),
        Some(Commands::Version) => commands::version::run(&cli.global),
        Some(other) => dispatch(&cli.global, other),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        if cli.global.json {
            let err_json = serde_json::json!({ "error": format!("{:#}", e) });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{s}");
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

/// Dispatches every subcommand that needs an opened index (everything
/// except `init`/`version`, which must work before one necessarily exists).
fn dispatch(global: &cli::GlobalArgs, command: &Commands) -> anyhow::Result<()> {
    let ctx = RuntimeContext::build(global)?;
    match command {
        Commands::Create(args) => commands::create::run(&ctx, args),
        Commands::Show(args) => commands::show::run(&ctx, args),
        Commands::List(args) => commands::list::run(&ctx, args),
        Commands::Update(args) => commands::update::run(&ctx, args),
        Commands::Delete(args) => commands::delete::run(&ctx, args),
        Commands::Search(args) => commands::search::run(&ctx, args),
        Commands::Tag(args) => commands::tag::run(&ctx, args),
        Commands::Status(args) => commands::status::run(&ctx, args),
        Commands::TypeCmd(args) => commands::type_cmd::run(&ctx, args),
        Commands::State(args) => commands::state::run(&ctx, args),
        Commands::MoveCmd(args) => commands::move_cmd::run(&ctx, args),
        Commands::Rebuild(args) => commands::rebuild::run(&ctx, args),
        Commands::Init(_) | Commands::Version => unreachable!("handled before dispatch"),
    }
}
