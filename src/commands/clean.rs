//! # Clean Command Implementation
//!
//! Deletes the workspace directory, including every checkout inside it.
//! Requires `--force` and refuses directories without a `workspace.yaml`.

use anyhow::Result;
use clap::Args;

use agentws::workspace;

use crate::cli::Globals;

/// Delete the whole workspace directory
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Confirm deletion
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `clean` command.
pub fn execute(args: CleanArgs, globals: &Globals) -> Result<()> {
    let removed = workspace::clean(&globals.root, args.force)?;
    println!("Removed {}", removed.display());
    Ok(())
}
