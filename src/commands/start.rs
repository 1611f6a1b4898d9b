//! # Start Command Implementation
//!
//! Derives a ticket branch name (`<prefix>/<ticket>[-<slug>]`) and switches
//! every selected repository to it, creating the branch where needed.

use anyhow::Result;
use clap::Args;

use agentws::branch::{self, DEFAULT_PREFIX};
use agentws::checkout::SwitchOptions;

use crate::cli::Globals;
use crate::commands::{checkout, SelectionArgs, StrategyArgs};

/// Start a ticket branch across the selected repositories
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Ticket identifier, e.g. JIRA-123
    pub ticket: String,

    /// Short description appended to the branch name
    pub slug: Option<String>,

    /// Branch name prefix
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Start point for the new branch (defaults to the base ref)
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

/// Execute the `start` command.
pub fn execute(args: StartArgs, globals: &Globals) -> Result<()> {
    let strategy = args.strategy.resolve()?;
    let name = branch::branch_name(&args.prefix, &args.ticket, args.slug.as_deref());
    println!("Branch: {}", globals.output.heading(&name));

    let options = SwitchOptions {
        branch: name,
        create: true,
        from: args.from,
        strategy,
        dry_run: args.dry_run,
    };
    checkout::run(&options, &args.selection, globals)
}
