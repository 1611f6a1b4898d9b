//! # Branches Command Implementation

use anyhow::Result;
use clap::Args;

use agentws::output::Table;
use agentws::repository::DefaultGitOperations;
use agentws::status;
use agentws::workspace::Context;

use crate::cli::Globals;
use crate::commands::SelectionArgs;

/// Show the current branch of each repository
#[derive(Args, Debug)]
pub struct BranchesArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Execute the `branches` command.
pub fn execute(args: BranchesArgs, globals: &Globals) -> Result<()> {
    let ctx = Context::load(&globals.root)?;
    let repos = args.selection.select(&ctx)?;
    let infos = status::branch_infos(&ctx, &DefaultGitOperations, &repos);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    let mut table = Table::new(&["REPO", "BRANCH", "HEAD", "DIRTY"]);
    for info in &infos {
        let dirty = if info.dirty {
            globals.output.attention("yes")
        } else {
            String::new()
        };
        table.row([info.repo.clone(), info.branch.clone(), info.head.clone(), dirty]);
    }
    print!("{}", table.render());
    Ok(())
}
