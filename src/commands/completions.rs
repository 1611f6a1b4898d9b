//! # Completions Command Implementation
//!
//! Prints a completion script for the given shell to stdout, e.g.
//!
//! ```bash
//! agentws completions bash > ~/.local/share/bash-completion/completions/agentws
//! agentws completions zsh > ~/.zfunc/_agentws
//! ```

use std::io;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell (bash, zsh, fish, powershell, elvish)
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
