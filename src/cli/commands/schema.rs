//! Schema command implementation.
//!
//! `stepwise schema` prints the JSON Schema of the definition format,
//! for editor completion and validation of definition files.

use schemars::schema_for;

use crate::config::StepDefinition;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The schema command implementation.
pub struct SchemaCommand;

impl SchemaCommand {
    /// Render the definition schema as pretty JSON.
    pub fn render() -> Result<String> {
        let schema = schema_for!(StepDefinition);
        serde_json::to_string_pretty(&schema)
            .map_err(|e| anyhow::anyhow!("failed to serialize schema: {}", e).into())
    }
}

impl Command for SchemaCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        println!("{}", Self::render()?);
        Ok(CommandResult::success())
    }
}
