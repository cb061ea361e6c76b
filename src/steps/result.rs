//! Run results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::actions::Outcome;
use crate::error::StepwiseError;

/// Final status of a step in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Applied or already satisfied.
    Succeeded,

    /// Action failed.
    Failed,

    /// Never ran.
    Skipped,
}

impl StepStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Succeeded => '✓',
            StepStatus::Failed => '✗',
            StepStatus::Skipped => '○',
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Result of one step in one run. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Step name.
    pub step_name: String,

    /// Final status.
    pub status: StepStatus,

    /// What the action reported, when it succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,

    /// Failure cause, or why the step was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Time spent in the action, including retries.
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,

    /// Number of times the action was invoked.
    pub attempts: u32,
}

impl RunResult {
    /// Create a succeeded result.
    pub fn succeeded(name: &str, outcome: Outcome, duration: Duration, attempts: u32) -> Self {
        Self {
            step_name: name.to_string(),
            status: StepStatus::Succeeded,
            outcome: Some(outcome),
            error: None,
            duration,
            attempts,
        }
    }

    /// Create a failed result.
    pub fn failed(name: &str, error: impl Into<String>, duration: Duration, attempts: u32) -> Self {
        Self {
            step_name: name.to_string(),
            status: StepStatus::Failed,
            outcome: None,
            error: Some(error.into()),
            duration,
            attempts,
        }
    }

    /// Create a skipped result.
    pub fn skipped(name: &str, reason: impl Into<String>) -> Self {
        Self {
            step_name: name.to_string(),
            status: StepStatus::Skipped,
            outcome: None,
            error: Some(reason.into()),
            duration: Duration::ZERO,
            attempts: 0,
        }
    }

    /// Whether the action changed the system.
    pub fn changed(&self) -> bool {
        self.outcome.as_ref().is_some_and(Outcome::is_applied)
    }

    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        let mark = self.status.display_char();
        match self.status {
            StepStatus::Succeeded => {
                let detail = self
                    .outcome
                    .as_ref()
                    .map(Outcome::label)
                    .unwrap_or_default();
                format!(
                    "{} {} ({}, {})",
                    mark,
                    self.step_name,
                    detail,
                    crate::ui::format_duration(self.duration)
                )
            }
            StepStatus::Failed | StepStatus::Skipped => {
                let cause = self.error.as_deref().unwrap_or("unknown error");
                format!("{} {} - {}", mark, self.step_name, cause)
            }
        }
    }
}

/// Counts of final statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Outcome of a whole run: every step's result in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Results in the order steps reached a final state.
    pub results: Vec<RunResult>,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// Total wall time.
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,

    /// Whether actions were asked not to mutate anything.
    pub dry_run: bool,
}

impl RunReport {
    /// Count results by status.
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for result in &self.results {
            match result.status {
                StepStatus::Succeeded => counts.succeeded += 1,
                StepStatus::Failed => counts.failed += 1,
                StepStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    /// Whether every step succeeded.
    pub fn success(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.status == StepStatus::Succeeded)
    }

    /// Find the result for a step.
    pub fn result(&self, step: &str) -> Option<&RunResult> {
        self.results.iter().find(|r| r.step_name == step)
    }

    /// Step names in execution order.
    pub fn order(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.step_name.as_str()).collect()
    }

    /// Process exit code for this run.
    ///
    /// 0 when every step succeeded, otherwise the number of failed steps
    /// capped at 255. A run with no failures but skipped steps exits 1.
    pub fn exit_code(&self) -> u8 {
        let counts = self.counts();
        if counts.failed > 0 {
            counts.failed.min(255) as u8
        } else if counts.skipped > 0 {
            1
        } else {
            0
        }
    }

    /// Turn the report into an error naming the first failed step.
    pub fn into_result(self) -> crate::error::Result<RunReport> {
        let failure = self
            .results
            .iter()
            .find(|r| r.status == StepStatus::Failed)
            .map(|r| StepwiseError::ActionFailed {
                step: r.step_name.clone(),
                message: r.error.clone().unwrap_or_default(),
            });

        match failure {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
