//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::Result;
use crate::runner::CancellationToken;
use crate::ui::UserInterface;

use super::run::RunCommand;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: u8,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: u8) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result carrying an exit code where 0 means success.
    pub fn from_exit_code(exit_code: u8) -> Self {
        if exit_code == 0 {
            Self::success()
        } else {
            Self::failure(exit_code)
        }
    }
}

/// Dispatches CLI commands to their implementations.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    cancel: CancellationToken,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs started by this dispatcher stop starting steps once `cancel` fires.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    fn run_command(&self, args: &RunArgs) -> RunCommand {
        RunCommand::new(args.clone()).with_cancel(self.cancel.clone())
    }

    /// Dispatch and execute a command.
    ///
    /// Without a subcommand the top-level arguments are treated as `run`.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => self.run_command(args).execute(ui),
            Some(Commands::Validate(args)) => {
                super::validate::ValidateCommand::new(args.clone()).execute(ui)
            }
            Some(Commands::Plan(args)) => super::plan::PlanCommand::new(args.clone()).execute(ui),
            Some(Commands::Schema) => super::schema::SchemaCommand.execute(ui),
            Some(Commands::Completions(args)) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui)
            }
            None => self.run_command(&cli.run).execute(ui),
        }
    }
}
