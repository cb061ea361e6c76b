//! Idempotent actions.
//!
//! Every step carries one [`Action`]. Applying it either brings the system
//! into the desired state ([`Outcome::Applied`]) or finds it already there
//! ([`Outcome::AlreadySatisfied`]). Both count as success.
//!
//! Built-in actions:
//!
//! - [`CommandAction`] - run a shell command, guarded by a completed check
//! - [`PackageAction`] / [`PackageUpdateAction`] - system packages
//! - [`ServiceAction`] - start, stop, restart, or reload a service
//! - [`FileAction`] - keep a file's content and mode in place
//!
//! [`FnAction`] wraps a closure for library callers.
//!
//! # Example
//!
//! ```
//! use stepwise::actions::{Action, ActionContext, Outcome, PackageAction};
//! use stepwise::config::PackageManager;
//! use stepwise::shell::MockRunner;
//! use std::path::Path;
//!
//! let runner = MockRunner::new();
//! let ctx = ActionContext::new(Path::new("."), &runner);
//!
//! let action = PackageAction::new(PackageManager::Apt, vec!["golang".into()]);
//! let outcome = action.apply(&ctx).unwrap();
//! assert!(matches!(outcome, Outcome::AlreadySatisfied { .. }));
//! ```

pub mod command;
pub mod file;
pub mod package;
pub mod service;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::ActionConfig;
use crate::error::StepwiseError;
use crate::shell::{CommandOptions, CommandResult, CommandRunner};

pub use command::CommandAction;
pub use file::FileAction;
pub use package::{PackageAction, PackageUpdateAction, PACKAGE_LOCK};
pub use service::ServiceAction;

/// What a successful action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The action changed the system.
    Applied {
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    /// The desired state was already in place; nothing changed.
    AlreadySatisfied {
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl Outcome {
    pub fn applied() -> Self {
        Outcome::Applied { detail: None }
    }

    pub fn applied_with(detail: impl Into<String>) -> Self {
        Outcome::Applied {
            detail: Some(detail.into()),
        }
    }

    pub fn already_satisfied() -> Self {
        Outcome::AlreadySatisfied { detail: None }
    }

    pub fn satisfied_with(detail: impl Into<String>) -> Self {
        Outcome::AlreadySatisfied {
            detail: Some(detail.into()),
        }
    }

    /// Whether the system was changed.
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }

    /// Detail reported by the action, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Outcome::Applied { detail } | Outcome::AlreadySatisfied { detail } => {
                detail.as_deref()
            }
        }
    }

    /// Short display label, e.g. "applied: installed golang".
    pub fn label(&self) -> String {
        let kind = if self.is_applied() {
            "applied"
        } else {
            "already satisfied"
        };
        match self.detail() {
            Some(detail) => format!("{}: {}", kind, detail),
            None => kind.to_string(),
        }
    }
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Why an action could not reach its desired state.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A command the action depends on did not succeed.
    #[error("`{command}` {}: {output}", exit_status(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// Filesystem access failed.
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The command could not be started at all.
    #[error(transparent)]
    Runner(#[from] StepwiseError),

    /// Free-form failure.
    #[error("{0}")]
    Message(String),
}

impl ActionError {
    /// Build a command failure from a finished command.
    pub fn command_failed(command: &str, result: &CommandResult) -> Self {
        ActionError::CommandFailed {
            command: command.to_string(),
            code: result.exit_code,
            output: result.last_output_line().unwrap_or("no output").to_string(),
        }
    }
}

/// Everything an action may use while applying.
pub struct ActionContext<'a> {
    /// Directory relative paths resolve against.
    pub base_dir: &'a Path,

    /// Extra environment for commands.
    pub env: HashMap<String, String>,

    /// Probe state but change nothing.
    pub dry_run: bool,

    /// How commands are run.
    pub runner: &'a dyn CommandRunner,
}

impl<'a> ActionContext<'a> {
    pub fn new(base_dir: &'a Path, runner: &'a dyn CommandRunner) -> Self {
        Self {
            base_dir,
            env: HashMap::new(),
            dry_run: false,
            runner,
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Command options for this context.
    pub fn command_options(&self) -> CommandOptions {
        CommandOptions::captured(self.base_dir, &self.env)
    }

    /// Whether a probe command exits 0.
    pub fn probe(&self, command: &str) -> bool {
        self.runner.check(command, &self.command_options())
    }

    /// Run a command that must succeed.
    pub fn run(&self, command: &str) -> Result<CommandResult, ActionError> {
        self.run_with_env(command, &[])
    }

    /// Run a command that must succeed, with extra environment.
    pub fn run_with_env(
        &self,
        command: &str,
        extra_env: &[(&str, &str)],
    ) -> Result<CommandResult, ActionError> {
        let mut options = self.command_options();
        for (key, value) in extra_env {
            options.env.insert(key.to_string(), value.to_string());
        }

        let result = self.runner.run(command, &options)?;
        if result.success {
            Ok(result)
        } else {
            Err(ActionError::command_failed(command, &result))
        }
    }

    /// Resolve a path against the base directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl fmt::Debug for ActionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("base_dir", &self.base_dir)
            .field("env", &self.env)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

/// An idempotent unit of work.
///
/// `apply` may be called concurrently with other actions' `apply` in
/// parallel mode; actions touching a shared resource report it through
/// [`lock`](Action::lock).
pub trait Action: Send + Sync {
    /// One-line description for plans and logs.
    fn describe(&self) -> String;

    /// Name of a resource this action must hold exclusively.
    fn lock(&self) -> Option<&str> {
        None
    }

    /// Bring the system into the desired state.
    fn apply(&self, ctx: &ActionContext<'_>) -> Result<Outcome, ActionError>;
}

/// Build the action described by a step's configuration.
pub fn from_config(config: &ActionConfig) -> Box<dyn Action> {
    match config {
        ActionConfig::Command { command, check } => {
            Box::new(CommandAction::new(command.clone(), check.clone()))
        }
        ActionConfig::Package { manager, packages } => {
            Box::new(PackageAction::new(*manager, packages.clone()))
        }
        ActionConfig::PackageUpdate { manager } => Box::new(PackageUpdateAction::new(*manager)),
        ActionConfig::Service {
            service,
            operation,
            manager,
        } => Box::new(ServiceAction::new(service.clone(), *operation, *manager)),
        ActionConfig::File {
            path,
            content,
            mode,
        } => {
            let mode = mode.as_deref().and_then(|m| u32::from_str_radix(m, 8).ok());
            Box::new(FileAction::new(path.clone(), content.clone(), mode))
        }
    }
}

/// Action backed by a closure.
pub struct FnAction<F> {
    description: String,
    apply: F,
}

impl<F> FnAction<F>
where
    F: Fn(&ActionContext<'_>) -> Result<Outcome, ActionError> + Send + Sync,
{
    pub fn new(description: impl Into<String>, apply: F) -> Self {
        Self {
            description: description.into(),
            apply,
        }
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&ActionContext<'_>) -> Result<Outcome, ActionError> + Send + Sync,
{
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Result<Outcome, ActionError> {
        (self.apply)(ctx)
    }
}
