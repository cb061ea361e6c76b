//! Concurrent execution of independent steps.
//!
//! The scheduler thread owns all bookkeeping. It starts every step whose
//! dependencies have finished, up to `max_parallel` at a time, and never
//! starts two steps holding the same lock together. Workers report back
//! over a channel, so results arrive in completion order.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::debug;

use crate::error::{Result, StepwiseError};
use crate::steps::{RunResult, StateTracker, StepState};

use super::executor::{
    execute_step, final_state, skip_step, Executor, RunOptions, RunProgress,
};

/// Named mutexes held by steps that share a resource.
#[derive(Debug, Default)]
pub struct ResourceLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `name`, created on first use.
    pub fn get(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(name.to_string()).or_default())
    }
}

pub(super) fn run(
    executor: &Executor,
    order: &[String],
    options: &RunOptions,
    on_progress: &mut dyn FnMut(RunProgress<'_>),
) -> Result<Vec<RunResult>> {
    let locks = ResourceLocks::new();
    let total = order.len();
    let max_parallel = options.max_parallel.max(1);

    let mut tracker = StateTracker::new(executor.graph().steps());
    let mut pending: Vec<&str> = order.iter().map(String::as_str).collect();
    let mut held: HashSet<&str> = HashSet::new();
    let mut results = Vec::with_capacity(total);
    let mut in_flight = 0usize;
    let mut started = 0usize;

    let (tx, rx) = mpsc::channel::<RunResult>();
    let locks = &locks;
    let base_dir = executor.base_dir();
    let runner = executor.runner();

    thread::scope(|scope| -> Result<()> {
        loop {
            let mut i = 0;
            while i < pending.len() {
                let name = pending[i];
                let step = executor.lookup(name)?;

                if options.cancel.is_cancelled() {
                    let result = skip_step(&mut tracker, name, "cancelled".to_string())?;
                    on_progress(RunProgress::StepSkipped { result: &result });
                    results.push(result);
                    pending.remove(i);
                    continue;
                }

                let deps_finished = step
                    .depends_on
                    .iter()
                    .all(|d| tracker.state(d).is_some_and(|s| s.is_terminal()));
                if !deps_finished {
                    i += 1;
                    continue;
                }

                if let Some(reason) = executor.blocked_reason(step, &tracker, options.policy) {
                    let result = skip_step(&mut tracker, name, reason)?;
                    on_progress(RunProgress::StepSkipped { result: &result });
                    results.push(result);
                    pending.remove(i);
                    continue;
                }

                let lock = step.effective_lock();
                let lock_busy = lock.is_some_and(|l| held.contains(l));
                if in_flight >= max_parallel || lock_busy {
                    i += 1;
                    continue;
                }

                tracker.transition(name, StepState::Running)?;
                on_progress(RunProgress::StepStarting {
                    name,
                    index: started,
                    total,
                });
                started += 1;
                in_flight += 1;
                pending.remove(i);
                if let Some(lock) = lock {
                    held.insert(lock);
                }

                let tx = tx.clone();
                scope.spawn(move || {
                    let mutex = lock.map(|l| locks.get(l));
                    let _guard = mutex
                        .as_ref()
                        .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner));
                    debug!("Worker started step '{}'", step.name);

                    let result = execute_step(step, base_dir, runner, options);

                    // The scheduler outlives every worker, so a send only
                    // fails if it already returned an error.
                    let _ = tx.send(result);
                });
            }

            if in_flight == 0 {
                if let Some(stuck) = pending.first() {
                    return Err(StepwiseError::Other(anyhow::anyhow!(
                        "Step '{}' can never become ready",
                        stuck
                    )));
                }
                return Ok(());
            }

            let result = rx.recv().map_err(|e| StepwiseError::Other(e.into()))?;
            in_flight -= 1;

            let step = executor.lookup(&result.step_name)?;
            if let Some(lock) = step.effective_lock() {
                held.remove(lock);
            }
            tracker.transition(&result.step_name, final_state(result.status))?;
            on_progress(RunProgress::StepFinished { result: &result });
            results.push(result);
        }
    })?;

    Ok(results)
}
