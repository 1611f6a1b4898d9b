//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use agentws::output::OutputConfig;

use crate::commands;

/// agentws - Manage a workspace of git repositories
#[derive(Parser, Debug)]
#[command(name = "agentws")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Workspace root (the directory holding workspace.yaml)
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        env = "AGENTWS_ROOT",
        default_value = "."
    )]
    root: PathBuf,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new workspace.yaml
    Init(commands::init::InitArgs),

    /// Append repositories to workspace.yaml
    Add(commands::add::AddArgs),

    /// Clone or update every selected repository
    Sync(commands::sync::SyncArgs),

    /// Switch every selected repository to a branch
    Checkout(commands::checkout::CheckoutArgs),

    /// Start a ticket branch across the selected repositories
    Start(commands::start::StartArgs),

    /// Record the current commit of every repository in workspace.lock.yaml
    Pin(commands::pin::PinArgs),

    /// Show clone state, branch, HEAD and lock drift per repository
    Status(commands::status::StatusArgs),

    /// Show the current branch of each repository
    Branches(commands::branches::BranchesArgs),

    /// Run a command from the workspace root
    Run(commands::run::RunArgs),

    /// Delete the whole workspace directory
    Clean(commands::clean::CleanArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct Globals {
    pub root: PathBuf,
    pub output: OutputConfig,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let env = env_logger::Env::default().default_filter_or(&self.log_level);
        env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .init();

        let globals = Globals {
            root: self.root,
            output: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &globals),
            Commands::Add(args) => commands::add::execute(args, &globals),
            Commands::Sync(args) => commands::sync::execute(args, &globals),
            Commands::Checkout(args) => commands::checkout::execute(args, &globals),
            Commands::Start(args) => commands::start::execute(args, &globals),
            Commands::Pin(args) => commands::pin::execute(args, &globals),
            Commands::Status(args) => commands::status::execute(args, &globals),
            Commands::Branches(args) => commands::branches::execute(args, &globals),
            Commands::Run(args) => commands::run::execute(args, &globals),
            Commands::Clean(args) => commands::clean::execute(args, &globals),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
