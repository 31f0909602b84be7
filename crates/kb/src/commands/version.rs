//! `kb version` -- print version, build info, and platform.

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::output::output_json;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const BUILD: &str = match option_env!("KB_BUILD") {
    Some(b) => b,
    None => "dev",
};

pub fn run(global: &GlobalArgs) -> Result<()> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    if global.json {
        output_json(&serde_json::json!({
            "version": VERSION,
            "build": BUILD,
            "os": os,
            "arch": arch,
        }));
    } else {
        println!("kb version {VERSION} ({BUILD}) {os}/{arch}");
    }
    Ok(())
}
