//! # Add Command Implementation
//!
//! Appends repositories to `workspace.yaml`, either from remote URLs (the
//! default branch is detected from the remote) or as local-only repos.
//! With `--sync` the new repos are cloned or initialized right away.

use anyhow::Result;
use clap::Args;

use agentws::add::{self, AddRequest};
use agentws::repository::DefaultGitOperations;
use agentws::workspace::Context;

use crate::cli::Globals;

/// Append repositories to workspace.yaml
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Repository URLs (or ids with --local)
    #[arg(value_name = "URL")]
    pub args: Vec<String>,

    /// Add local-only repositories that have no remote
    #[arg(long)]
    pub local: bool,

    /// Repository id (single URL only)
    #[arg(long)]
    pub id: Option<String>,

    /// Checkout path relative to the workspace root (single URL only)
    #[arg(long)]
    pub path: Option<String>,

    /// Branch to track (defaults to the remote's default branch)
    #[arg(long = "ref", value_name = "REF")]
    pub r#ref: Option<String>,

    /// Tag to attach (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Clone or initialize the new repositories immediately
    #[arg(long)]
    pub sync: bool,

    /// Print the added entries as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, globals: &Globals) -> Result<()> {
    let ctx = Context::load(&globals.root)?;
    let git = DefaultGitOperations;

    let request = AddRequest {
        args: args.args,
        local: args.local,
        id: args.id,
        path: args.path,
        r#ref: args.r#ref,
        tags: args.tags,
    };
    let new_repos = add::build_repos(&ctx.manifest, &git, &request)?;
    add::append(&ctx, &new_repos)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&new_repos)?);
    } else {
        for repo in &new_repos {
            println!("Added {} ({}) -> {}", repo.id, repo.effective_ref(), repo.path);
        }
    }

    if args.sync {
        let failed = add::materialize(&ctx, &git, &new_repos);
        if failed.is_empty() && !args.json {
            println!("{}", globals.output.good("Sync complete."));
        }
    }
    Ok(())
}
