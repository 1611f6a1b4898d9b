//! # Run Command Implementation
//!
//! Runs an arbitrary command from the workspace root with the terminal's
//! stdin, stdout and stderr. The command is executed from its argv, never
//! through a shell; its exit code becomes agentws's exit code.
//!
//! ```bash
//! agentws run -- ls repos
//! ```

use std::process::{Command, Stdio};

use anyhow::Result;
use clap::Args;
use log::debug;

use crate::cli::Globals;

/// Run a command from the workspace root
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Command and its arguments (after `--`)
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Execute the `run` command.
pub fn execute(args: RunArgs, globals: &Globals) -> Result<()> {
    let Some((program, rest)) = args.command.split_first() else {
        anyhow::bail!("usage: agentws run -- <command...>");
    };

    debug!("running {:?} in {}", args.command, globals.root.display());
    let status = Command::new(program)
        .args(rest)
        .current_dir(&globals.root)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| anyhow::anyhow!("failed to start `{}`: {}", program, e))?;

    if !status.success() {
        // Killed by a signal: no code, report a generic failure.
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}
