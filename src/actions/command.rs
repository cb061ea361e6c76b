//! Shell command action.

use crate::config::CompletedCheck;
use crate::steps::completed_check::run_check;

use super::{Action, ActionContext, ActionError, Outcome};

/// Runs a shell command unless its completed check already passes.
///
/// Without a check the command runs every time, so it must be safe to
/// repeat.
#[derive(Debug, Clone)]
pub struct CommandAction {
    command: String,
    check: Option<CompletedCheck>,
}

impl CommandAction {
    pub fn new(command: impl Into<String>, check: Option<CompletedCheck>) -> Self {
        Self {
            command: command.into(),
            check,
        }
    }
}

impl Action for CommandAction {
    fn describe(&self) -> String {
        format!("run `{}`", self.command)
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Result<Outcome, ActionError> {
        if let Some(check) = &self.check {
            let result = run_check(check, ctx.base_dir, ctx.runner, &ctx.command_options());
            if result.complete {
                return Ok(Outcome::satisfied_with(result.short_description()));
            }
            tracing::debug!("Check not satisfied: {}", result.description);
        }

        if ctx.dry_run {
            return Ok(Outcome::applied_with(format!("would run `{}`", self.command)));
        }

        ctx.run(&self.command)?;
        Ok(Outcome::applied())
    }
}
