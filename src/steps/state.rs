//! Per-step state machine.
//!
//! ```text
//! pending ──> running ──> succeeded
//!    │           └──────> failed
//!    └──────> skipped
//! ```

use std::collections::HashMap;

use crate::error::{Result, StepwiseError};

/// Lifecycle state of a step within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Step is waiting to run.
    Pending,

    /// Step's action is executing.
    Running,

    /// Action reported applied or already satisfied.
    Succeeded,

    /// Action failed on every attempt.
    Failed,

    /// Step never ran (dependency failed or run cancelled).
    Skipped,
}

impl StepState {
    /// Check if this is a terminal state (no more changes expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Succeeded | StepState::Failed | StepState::Skipped
        )
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: StepState) -> bool {
        matches!(
            (self, next),
            (StepState::Pending, StepState::Running)
                | (StepState::Pending, StepState::Skipped)
                | (StepState::Running, StepState::Succeeded)
                | (StepState::Running, StepState::Failed)
        )
    }
}

impl std::fmt::Display for StepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepState::Pending => "pending",
            StepState::Running => "running",
            StepState::Succeeded => "succeeded",
            StepState::Failed => "failed",
            StepState::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Tracks the state of every step in a run and rejects illegal transitions.
#[derive(Debug, Clone, Default)]
pub struct StateTracker {
    states: HashMap<String, StepState>,
}

impl StateTracker {
    /// Start tracking the given steps, all pending.
    pub fn new<'a>(steps: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            states: steps
                .into_iter()
                .map(|s| (s.clone(), StepState::Pending))
                .collect(),
        }
    }

    /// Current state of a step.
    pub fn state(&self, step: &str) -> Option<StepState> {
        self.states.get(step).copied()
    }

    /// Move a step to `next`.
    ///
    /// # Errors
    ///
    /// Fails if the step is unknown or the transition is not allowed.
    pub fn transition(&mut self, step: &str, next: StepState) -> Result<()> {
        let current = self.states.get_mut(step).ok_or_else(|| {
            StepwiseError::Other(anyhow::anyhow!("Step '{}' is not tracked", step))
        })?;

        if !current.can_transition_to(next) {
            return Err(StepwiseError::Other(anyhow::anyhow!(
                "Step '{}' cannot move from {} to {}",
                step,
                current,
                next
            )));
        }

        *current = next;
        Ok(())
    }

    /// Steps still pending.
    pub fn pending_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == StepState::Pending)
            .count()
    }

    /// Whether every step reached a terminal state.
    pub fn all_terminal(&self) -> bool {
        self.states.values().all(StepState::is_terminal)
    }
}
