//! # Init Command Implementation
//!
//! Creates a minimal `workspace.yaml` in the workspace root. An existing
//! manifest is only overwritten with `--force`.

use anyhow::Result;
use clap::Args;

use agentws::workspace::{self, InitOptions};

use crate::cli::Globals;

/// Create a new workspace.yaml
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Workspace name
    pub name: String,

    /// Directory new repositories are placed under by `add`
    #[arg(long, value_name = "DIR")]
    pub repos_root: Option<String>,

    /// Default branch new branches start from (bare name, e.g. main)
    #[arg(long, value_name = "BRANCH")]
    pub base_ref: Option<String>,

    /// Overwrite an existing workspace.yaml
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `init` command.
pub fn execute(args: InitArgs, globals: &Globals) -> Result<()> {
    let options = InitOptions {
        name: args.name,
        repos_root: args.repos_root,
        base_ref: args.base_ref,
        force: args.force,
    };
    let path = workspace::init(&globals.root, &options)?;
    println!("{} {}", globals.output.good("Created"), path.display());
    Ok(())
}
