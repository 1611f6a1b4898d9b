//! # Checkout Command Implementation
//!
//! Switches every selected repository to one branch, optionally creating it.
//! Repositories are processed one at a time in manifest order.

use anyhow::Result;
use clap::Args;

use agentws::checkout::{self, SwitchOptions};
use agentws::repository::DefaultGitOperations;
use agentws::workspace::Context;

use crate::cli::Globals;
use crate::commands::{SelectionArgs, StrategyArgs};

/// Switch every selected repository to a branch
#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Branch to switch to
    #[arg(short, long)]
    pub branch: String,

    /// Create the branch where it exists neither locally nor on the remote
    #[arg(short, long)]
    pub create: bool,

    /// Start point for created branches (defaults to the base ref)
    #[arg(long, value_name = "REF")]
    pub from: Option<String>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Show what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `checkout` command.
pub fn execute(args: CheckoutArgs, globals: &Globals) -> Result<()> {
    let strategy = args.strategy.resolve()?;
    let options = SwitchOptions {
        branch: args.branch,
        create: args.create,
        from: args.from,
        strategy,
        dry_run: args.dry_run,
    };
    run(&options, &args.selection, globals)
}

/// Shared by `checkout` and `start`.
pub fn run(options: &SwitchOptions, selection: &SelectionArgs, globals: &Globals) -> Result<()> {
    let ctx = Context::load(&globals.root)?;
    let repos = selection.select(&ctx)?;
    let git = DefaultGitOperations;

    checkout::switch_repos(&ctx, &git, &repos, options, |result| println!("{}", result))?;
    Ok(())
}
