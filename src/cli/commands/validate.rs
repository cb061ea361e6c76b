//! Validate command implementation.
//!
//! `stepwise validate` loads a definition with its includes and reports
//! every validation error at once.

use serde_json::json;

use crate::cli::args::DefinitionArgs;
use crate::config::validate;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::{definition_title, load_or_report};

/// The validate command implementation.
pub struct ValidateCommand {
    args: DefinitionArgs,
}

impl ValidateCommand {
    pub fn new(args: DefinitionArgs) -> Self {
        Self { args }
    }
}

impl Command for ValidateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(loaded) = load_or_report(&self.args.definition, ui) else {
            return Ok(CommandResult::failure(1));
        };

        let errors = validate(&loaded.definition);

        if self.args.json {
            let output = json!({
                "valid": errors.is_empty(),
                "steps": loaded.definition.steps.len(),
                "sources": loaded.sources,
                "errors": errors,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        } else if errors.is_empty() {
            let count = loaded.definition.steps.len();
            ui.success(&format!(
                "{} is valid ({} {})",
                definition_title(&loaded, &self.args.definition),
                count,
                if count == 1 { "step" } else { "steps" }
            ));
        } else {
            for error in &errors {
                match &error.step {
                    Some(step) => ui.error(&format!("[{}] {}: {}", error.rule, step, error.message)),
                    None => ui.error(&format!("[{}] {}", error.rule, error.message)),
                }
            }
            ui.message(&format!(
                "{} error{} found",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
        }

        if errors.is_empty() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}
