//! Step execution orchestration.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::actions::ActionContext;
use crate::config::{validate_strict, LoadedDefinition, Settings};
use crate::error::{Result, StepwiseError};
use crate::shell::CommandRunner;
use crate::steps::{RunReport, RunResult, StateTracker, Step, StepState, StepStatus};

use super::cancel::CancellationToken;
use super::dependency::DependencyGraph;
use super::parallel;

/// What happens to the dependents of a failed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Skip every step that transitively depends on a failed step.
    /// Independent steps still run.
    #[default]
    FailFast,

    /// Attempt dependents of failed steps anyway. Steps whose dependency
    /// was skipped are still skipped.
    ContinueOnError,
}

impl FailurePolicy {
    pub fn from_continue_on_error(continue_on_error: bool) -> Self {
        if continue_on_error {
            FailurePolicy::ContinueOnError
        } else {
            FailurePolicy::FailFast
        }
    }
}

/// Options for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Failure handling.
    pub policy: FailurePolicy,
    /// Run independent steps concurrently.
    pub parallel: bool,
    /// Concurrency limit in parallel mode.
    pub max_parallel: usize,
    /// Ask actions to probe without changing anything.
    pub dry_run: bool,
    /// Environment passed to every action.
    pub env: HashMap<String, String>,
    /// Stops the run from starting further steps.
    pub cancel: CancellationToken,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::FailFast,
            parallel: false,
            max_parallel: 4,
            dry_run: false,
            env: HashMap::new(),
            cancel: CancellationToken::new(),
        }
    }
}

impl RunOptions {
    /// Options taken from a definition's settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            policy: FailurePolicy::from_continue_on_error(settings.continue_on_error),
            parallel: settings.parallel,
            max_parallel: settings.max_parallel.max(1),
            env: settings.env.clone(),
            ..Default::default()
        }
    }
}

/// Progress events emitted during a run.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step is about to start.
    StepStarting {
        name: &'a str,
        index: usize,
        total: usize,
    },
    /// A step finished, successfully or not.
    StepFinished { result: &'a RunResult },
    /// A step was skipped without running.
    StepSkipped { result: &'a RunResult },
}

/// Runs a set of steps in dependency order.
///
/// Construction rejects duplicate names, unknown dependencies and cycles,
/// so no action runs for a broken step set.
pub struct Executor {
    steps: Vec<Step>,
    graph: DependencyGraph,
    base_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl Executor {
    /// Create an executor for `steps`, in declaration order.
    pub fn new(steps: Vec<Step>, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let mut builder = DependencyGraph::builder();
        for step in &steps {
            builder = builder.add_step(step.name.clone(), step.depends_on.clone());
        }
        let graph = builder.build()?;

        if let Some(cycle) = graph.find_cycle() {
            return Err(StepwiseError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        Ok(Self {
            steps,
            graph,
            base_dir: PathBuf::from("."),
            runner,
        })
    }

    /// Create an executor for a loaded definition.
    ///
    /// The definition is validated first; actions resolve relative paths
    /// against the definition's directory.
    pub fn from_definition(loaded: &LoadedDefinition, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        validate_strict(&loaded.definition)?;
        let steps = loaded.definition.steps.iter().map(Step::from_config).collect();
        Ok(Self::new(steps, runner)?.with_base_dir(&loaded.base_dir))
    }

    /// Set the directory relative paths resolve against.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Steps in declaration order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.graph.position(name).map(|i| &self.steps[i])
    }

    pub(super) fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub(super) fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Steps in the order a sequential run executes them.
    pub fn plan(&self) -> Result<Vec<&Step>> {
        self.graph
            .topological_order()?
            .iter()
            .map(|name| self.lookup(name))
            .collect()
    }

    /// Run every step.
    pub fn run(&self, options: &RunOptions) -> Result<RunReport> {
        self.run_with_progress(options, |_| {})
    }

    /// Run every step, reporting progress as steps start and finish.
    ///
    /// Action failures never abort the run; they are recorded in the
    /// report. An `Err` means the run could not be carried out at all.
    pub fn run_with_progress(
        &self,
        options: &RunOptions,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<RunReport> {
        let start = Instant::now();
        let started_at = Utc::now();
        let order = self.graph.topological_order()?;

        info!(
            "Running {} steps ({}{})",
            order.len(),
            if options.parallel { "parallel" } else { "sequential" },
            if options.dry_run { ", dry run" } else { "" }
        );

        let results = if options.parallel && options.max_parallel > 1 {
            parallel::run(self, &order, options, &mut on_progress)?
        } else {
            self.run_sequential(&order, options, &mut on_progress)?
        };

        let report = RunReport {
            results,
            started_at,
            duration: start.elapsed(),
            dry_run: options.dry_run,
        };

        let counts = report.counts();
        info!(
            "Run finished: {} succeeded, {} failed, {} skipped",
            counts.succeeded, counts.failed, counts.skipped
        );

        Ok(report)
    }

    fn run_sequential(
        &self,
        order: &[String],
        options: &RunOptions,
        on_progress: &mut dyn FnMut(RunProgress<'_>),
    ) -> Result<Vec<RunResult>> {
        let mut tracker = StateTracker::new(self.graph.steps());
        let mut results = Vec::with_capacity(order.len());
        let total = order.len();
        let mut started = 0;

        for name in order {
            let step = self.lookup(name)?;

            let skip = if options.cancel.is_cancelled() {
                Some("cancelled".to_string())
            } else {
                self.blocked_reason(step, &tracker, options.policy)
            };

            if let Some(reason) = skip {
                let result = skip_step(&mut tracker, name, reason)?;
                on_progress(RunProgress::StepSkipped { result: &result });
                results.push(result);
                continue;
            }

            tracker.transition(name, StepState::Running)?;
            on_progress(RunProgress::StepStarting {
                name,
                index: started,
                total,
            });
            started += 1;

            let result = execute_step(step, &self.base_dir, self.runner.as_ref(), options);
            tracker.transition(name, final_state(result.status))?;
            on_progress(RunProgress::StepFinished { result: &result });
            results.push(result);
        }

        Ok(results)
    }

    pub(super) fn lookup(&self, name: &str) -> Result<&Step> {
        self.step(name).ok_or_else(|| StepwiseError::DefinitionValidationError {
            message: format!("Step '{}' not found", name),
        })
    }

    /// Why a step whose dependencies have all finished must not run.
    pub(super) fn blocked_reason(
        &self,
        step: &Step,
        tracker: &StateTracker,
        policy: FailurePolicy,
    ) -> Option<String> {
        for dep in &step.depends_on {
            match tracker.state(dep) {
                Some(StepState::Succeeded) => {}
                Some(StepState::Failed) if policy == FailurePolicy::ContinueOnError => {}
                Some(StepState::Failed) => return Some(format!("dependency '{}' failed", dep)),
                Some(StepState::Skipped) => {
                    return Some(format!("dependency '{}' was skipped", dep))
                }
                _ => return Some(format!("dependency '{}' did not finish", dep)),
            }
        }
        None
    }
}

pub(super) fn skip_step(
    tracker: &mut StateTracker,
    name: &str,
    reason: String,
) -> Result<RunResult> {
    tracker.transition(name, StepState::Skipped)?;
    info!("Skipping step '{}': {}", name, reason);
    Ok(RunResult::skipped(name, reason))
}

pub(super) fn final_state(status: StepStatus) -> StepState {
    match status {
        StepStatus::Succeeded => StepState::Succeeded,
        StepStatus::Failed => StepState::Failed,
        StepStatus::Skipped => StepState::Skipped,
    }
}

/// Apply a step's action, retrying up to `step.retry` extra times.
///
/// A panicking action fails the step without retrying.
pub(super) fn execute_step(
    step: &Step,
    base_dir: &Path,
    runner: &dyn CommandRunner,
    options: &RunOptions,
) -> RunResult {
    let mut env = options.env.clone();
    env.extend(step.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    let ctx = ActionContext::new(base_dir, runner)
        .with_env(env)
        .with_dry_run(options.dry_run);

    let start = Instant::now();
    let max_attempts = step.retry.saturating_add(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!("Applying step '{}': {}", step.name, step.action.describe());

        let applied = match panic::catch_unwind(AssertUnwindSafe(|| step.action.apply(&ctx))) {
            Ok(applied) => applied,
            Err(_) => {
                warn!("Step '{}' panicked", step.name);
                return RunResult::failed(&step.name, "action panicked", start.elapsed(), attempt);
            }
        };

        match applied {
            Ok(outcome) => {
                info!("Step '{}' succeeded: {}", step.name, outcome.label());
                return RunResult::succeeded(&step.name, outcome, start.elapsed(), attempt);
            }
            Err(e) if attempt < max_attempts && !options.cancel.is_cancelled() => {
                warn!(
                    "Step '{}' attempt {}/{} failed, retrying: {}",
                    step.name, attempt, max_attempts, e
                );
            }
            Err(e) => {
                warn!("Step '{}' failed: {}", step.name, e);
                return RunResult::failed(&step.name, e.to_string(), start.elapsed(), attempt);
            }
        }
    }
}
