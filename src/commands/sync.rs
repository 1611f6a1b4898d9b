//! # Sync Command Implementation
//!
//! Clones missing repositories, fetches existing ones and checks out each
//! repo's tracked ref (or its pinned commit with `--lock`), running up to
//! `--jobs` repositories at once.

use anyhow::Result;
use clap::Args;

use agentws::pin;
use agentws::progress::Progress;
use agentws::repository::DefaultGitOperations;
use agentws::sync::{self, SyncOptions, DEFAULT_JOBS};
use agentws::workspace::Context;

use crate::cli::Globals;
use crate::commands::{SelectionArgs, StrategyArgs};

/// Clone or update every selected repository
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Number of repositories synced in parallel
    #[arg(short, long, env = "AGENTWS_JOBS", default_value_t = DEFAULT_JOBS)]
    pub jobs: usize,

    /// Check out the commits pinned in workspace.lock.yaml
    #[arg(long)]
    pub lock: bool,

    /// Pin the selected repos' commits into workspace.lock.yaml afterwards
    #[arg(long)]
    pub update_lock: bool,
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, globals: &Globals) -> Result<()> {
    let strategy = args.strategy.resolve()?;
    sync::validate_jobs(args.jobs)?;

    let ctx = Context::load(&globals.root)?;
    let repos = args.selection.select(&ctx)?;
    let git = DefaultGitOperations;

    let options = SyncOptions {
        strategy,
        use_lock: args.lock,
        jobs: args.jobs,
    };
    let progress = Progress::for_terminal(repos.len(), &globals.output);
    let result = sync::sync(&ctx, &git, &repos, &options, &progress);
    progress.finish();
    result?;

    // Skipped and failed repos keep an entry at their current HEAD.
    if args.update_lock {
        let outcome = pin::pin(&ctx, &git, &repos)?;
        pin::write(&ctx, &outcome.lock)?;
        println!("Lock file updated.");
    }

    println!("{}", globals.output.good("Sync complete."));
    Ok(())
}
