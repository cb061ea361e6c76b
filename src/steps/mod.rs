//! Steps and their results.
//!
//! - [`Step`] - a named action plus dependencies, ready to run
//! - [`StepState`] / [`StateTracker`] - the per-step state machine
//! - [`RunResult`] / [`RunReport`] - what happened to each step
//! - [`run_check`] - completed checks guarding command steps

pub mod completed_check;
pub mod result;
pub mod state;
pub mod step;

pub use completed_check::{run_check, CheckResult};
pub use result::{RunReport, RunResult, StatusCounts, StepStatus};
pub use state::{StateTracker, StepState};
pub use step::Step;
