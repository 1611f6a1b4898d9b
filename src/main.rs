//! # agentws CLI
//!
//! Binary entry point for the `agentws` command-line tool. Parses arguments
//! with `clap` and hands off to the command modules; all real work lives in
//! the `agentws` library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
