//! Run command implementation.
//!
//! `stepwise run` (or plain `stepwise`) loads a definition, executes its
//! steps in dependency order, and exits with the report's exit code.

use std::sync::Arc;

use tracing::debug;

use crate::cli::args::RunArgs;
use crate::config::{ActionConfig, LoadedDefinition};
use crate::error::Result;
use crate::runner::{CancellationToken, Executor, FailurePolicy, RunOptions, RunProgress};
use crate::shell::{is_elevated, CommandRunner, ShellRunner};
use crate::steps::{RunReport, StepStatus};
use crate::ui::{result_detail, SpinnerHandle, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::display::{definition_title, load_or_report};

/// Steps whose actions manage system packages or services.
fn privileged_steps(loaded: &LoadedDefinition) -> Vec<&str> {
    loaded
        .definition
        .steps
        .iter()
        .filter(|s| {
            matches!(
                s.action,
                ActionConfig::Package { .. }
                    | ActionConfig::PackageUpdate { .. }
                    | ActionConfig::Service { .. }
            )
        })
        .map(|s| s.name.as_str())
        .collect()
}

/// The run command implementation.
pub struct RunCommand {
    args: RunArgs,
    runner: Arc<dyn CommandRunner>,
    cancel: CancellationToken,
}

impl RunCommand {
    /// Create a run command that executes through the system shell.
    pub fn new(args: RunArgs) -> Self {
        Self::with_runner(args, Arc::new(ShellRunner))
    }

    /// Create a run command with a custom command runner.
    pub fn with_runner(args: RunArgs, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            args,
            runner,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop starting new steps once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Definition settings, overridden by flags and `STEPWISE_*` variables.
    fn build_options(&self, loaded: &LoadedDefinition) -> RunOptions {
        let mut options = RunOptions::from_settings(&loaded.definition.settings);

        if let Some(continue_on_error) = self.args.continue_on_error {
            options.policy = FailurePolicy::from_continue_on_error(continue_on_error);
        }
        if let Some(parallel) = self.args.parallel {
            options.parallel = parallel;
        }
        if let Some(jobs) = self.args.jobs {
            options.max_parallel = jobs.max(1);
            if jobs > 1 {
                options.parallel = true;
            }
        }
        options.dry_run = self.args.dry_run;
        options.cancel = self.cancel.clone();

        options
    }

    fn run_with_output(
        &self,
        executor: &Executor,
        options: &RunOptions,
        ui: &mut dyn UserInterface,
    ) -> Result<RunReport> {
        let parallel = options.parallel && options.max_parallel > 1;
        let show_steps = ui.output_mode().shows_steps();
        let show_details = ui.output_mode().shows_details();
        let mut spinner: Option<Box<dyn SpinnerHandle>> = None;

        executor.run_with_progress(options, |event| match event {
            RunProgress::StepStarting { name, index, total } => {
                let label = match executor.step(name) {
                    Some(step) if show_details => {
                        format!("{} - {}", step.display_title(), step.action.describe())
                    }
                    Some(step) => step.display_title().to_string(),
                    None => name.to_string(),
                };
                let line = format!("[{}/{}] {}", index + 1, total, label);
                if parallel {
                    if show_steps {
                        ui.message(&line);
                    }
                } else {
                    spinner = Some(ui.start_spinner(&line));
                }
            }
            RunProgress::StepFinished { result } => {
                let line = format!("{} - {}", result.step_name, result_detail(result));
                match spinner.take() {
                    Some(mut s) => match result.status {
                        StepStatus::Succeeded => s.finish_success(&line),
                        StepStatus::Failed => s.finish_error(&line),
                        StepStatus::Skipped => s.finish_skipped(&line),
                    },
                    None if show_steps || result.status == StepStatus::Failed => {
                        ui.show_step_result(result)
                    }
                    None => {}
                }
            }
            RunProgress::StepSkipped { result } => {
                if show_steps {
                    ui.show_step_result(result);
                }
            }
        })
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(loaded) = load_or_report(&self.args.definition, ui) else {
            return Ok(CommandResult::failure(1));
        };

        let executor = match Executor::from_definition(&loaded, Arc::clone(&self.runner)) {
            Ok(executor) => executor,
            Err(e) if e.is_definition_error() => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        let options = self.build_options(&loaded);
        debug!("Run options: {:?}", options);

        if self.args.json {
            let report = executor.run(&options)?;
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| anyhow::anyhow!("failed to serialize run report: {}", e))?;
            println!("{}", json);
            return Ok(CommandResult::from_exit_code(report.exit_code()));
        }

        let mut title = definition_title(&loaded, &self.args.definition);
        if options.dry_run {
            title.push_str(" (dry run)");
        }
        ui.show_header(&title);

        let privileged = privileged_steps(&loaded);
        if !options.dry_run && !privileged.is_empty() && !is_elevated() {
            ui.warning(&format!(
                "Not running as root; {} may need elevated privileges",
                privileged.join(", ")
            ));
        }

        let report = self.run_with_output(&executor, &options, ui)?;
        ui.show_run_summary(&report);

        Ok(CommandResult::from_exit_code(report.exit_code()))
    }
}
