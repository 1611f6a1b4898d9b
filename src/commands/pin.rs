//! # Pin Command Implementation
//!
//! Records the HEAD commit of every cloned repository in
//! `workspace.lock.yaml`, so `sync --lock` can reproduce them later.

use anyhow::Result;
use clap::Args;

use agentws::pin;
use agentws::repository::DefaultGitOperations;
use agentws::workspace::Context;

use crate::cli::Globals;

/// Record the current commit of every repository in workspace.lock.yaml
#[derive(Args, Debug)]
pub struct PinArgs {}

/// Execute the `pin` command.
pub fn execute(_args: PinArgs, globals: &Globals) -> Result<()> {
    let ctx = Context::load(&globals.root)?;
    let git = DefaultGitOperations;

    let outcome = pin::pin(&ctx, &git, &ctx.manifest.repos)?;
    for repo in &ctx.manifest.repos {
        if let Some((_, short)) = outcome.pinned.iter().find(|(id, _)| id == &repo.id) {
            println!("Pinned {} @ {}", repo.id, short);
        } else if outcome.skipped.contains(&repo.id) {
            println!("Skipping {} (not cloned)", repo.id);
        }
    }

    let path = pin::write(&ctx, &outcome.lock)?;
    println!("Lock file written to {}", path.display());
    Ok(())
}
