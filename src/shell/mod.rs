//! Shell command execution.

pub mod command;
pub mod mock;
pub mod platform;

pub use command::{
    execute, quote, CommandOptions, CommandResult, CommandRunner, ShellRunner,
};
pub use mock::MockRunner;
pub use platform::{is_ci, is_elevated, shell_program};
