//! # Status Command Implementation
//!
//! One row per repository: clone state, branch, short HEAD, dirty flag and
//! drift from the pinned commit.

use anyhow::Result;
use clap::Args;

use agentws::output::Table;
use agentws::repository::DefaultGitOperations;
use agentws::status;
use agentws::workspace::Context;

use crate::cli::Globals;
use crate::commands::SelectionArgs;

/// Show clone state, branch, HEAD and lock drift per repository
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, globals: &Globals) -> Result<()> {
    let ctx = Context::load(&globals.root)?;
    let repos = args.selection.select(&ctx)?;
    let statuses = status::collect_all(&ctx, &DefaultGitOperations, &repos);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    let out = &globals.output;
    let mut table = Table::new(&["REPO", "STATE", "BRANCH", "HEAD", "DIRTY", "LOCK"]);
    for s in &statuses {
        let dirty = if s.dirty {
            out.attention("yes")
        } else {
            String::new()
        };
        table.row([
            s.id.clone(),
            s.state(),
            s.branch.clone(),
            s.head.clone(),
            dirty,
            s.lock_diff.clone().map(|d| out.attention(&d)).unwrap_or_default(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}
