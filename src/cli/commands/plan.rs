//! Plan command implementation.
//!
//! `stepwise plan` prints the order a sequential run would follow and the
//! groups of steps a parallel run may start together.

use std::sync::Arc;

use serde_json::json;

use crate::cli::args::DefinitionArgs;
use crate::error::Result;
use crate::runner::Executor;
use crate::shell::ShellRunner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::{definition_title, load_or_report};

/// The plan command implementation.
pub struct PlanCommand {
    args: DefinitionArgs,
}

impl PlanCommand {
    pub fn new(args: DefinitionArgs) -> Self {
        Self { args }
    }
}

impl Command for PlanCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(loaded) = load_or_report(&self.args.definition, ui) else {
            return Ok(CommandResult::failure(1));
        };

        let executor = match Executor::from_definition(&loaded, Arc::new(ShellRunner)) {
            Ok(executor) => executor,
            Err(e) if e.is_definition_error() => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        let order = executor.plan()?;
        let groups = executor.graph().parallel_groups()?;

        if self.args.json {
            let steps: Vec<_> = order
                .iter()
                .map(|step| {
                    json!({
                        "name": step.name,
                        "title": step.display_title(),
                        "action": step.action.describe(),
                        "depends_on": step.depends_on,
                        "lock": step.effective_lock(),
                    })
                })
                .collect();
            let output = json!({ "order": steps, "groups": groups });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            return Ok(CommandResult::success());
        }

        ui.show_header(&definition_title(&loaded, &self.args.definition));

        for (i, step) in order.iter().enumerate() {
            let mut line = format!("{:>3}. {} - {}", i + 1, step.name, step.action.describe());
            if !step.depends_on.is_empty() {
                line.push_str(&format!(" (after {})", step.depends_on.join(", ")));
            }
            if ui.output_mode().shows_details() {
                if let Some(lock) = step.effective_lock() {
                    line.push_str(&format!(" [lock: {}]", lock));
                }
            }
            ui.message(&line);
        }

        ui.message("");
        ui.message("Parallel groups:");
        for (i, group) in groups.iter().enumerate() {
            ui.message(&format!("{:>3}. {}", i + 1, group.join(", ")));
        }

        Ok(CommandResult::success())
    }
}
