//! # CLI Command Implementations
//!
//! One module per `agentws` subcommand. Each module contains:
//! - an `Args` struct, derived using `clap`;
//! - an `execute` function that takes the parsed `Args` plus the global
//!   flags and calls into the `agentws` library.
//!
//! Argument groups used by several commands live here.

pub mod add;
pub mod branches;
pub mod checkout;
pub mod clean;
pub mod completions;
pub mod init;
pub mod pin;
pub mod run;
pub mod start;
pub mod status;
pub mod sync;

use anyhow::Result;
use clap::Args;

use agentws::dirty::{self, Strategy};
use agentws::manifest::{self, Repo};
use agentws::workspace::Context;

/// Which repositories a command operates on.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Only repositories selected by this profile
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Only these repository ids (comma-separated or repeated)
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip these repository ids (comma-separated or repeated)
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub skip: Vec<String>,
}

impl SelectionArgs {
    pub fn select(&self, ctx: &Context) -> Result<Vec<Repo>> {
        Ok(manifest::select_repos(
            &ctx.manifest,
            self.profile.as_deref(),
            &self.only,
            &self.skip,
        )?)
    }
}

/// How dirty working trees are handled.
#[derive(Args, Debug, Clone)]
pub struct StrategyArgs {
    /// Dirty working tree handling (safe, stash, reset)
    #[arg(long, value_name = "STRATEGY", default_value = "safe")]
    pub strategy: String,

    /// Confirm destructive strategies (required by --strategy reset)
    #[arg(long)]
    pub force: bool,
}

impl StrategyArgs {
    /// Parses the strategy and checks that `reset` was confirmed.
    pub fn resolve(&self) -> Result<Strategy> {
        let strategy: Strategy = self.strategy.parse()?;
        dirty::check_confirmation(strategy, self.force)?;
        Ok(strategy)
    }
}
