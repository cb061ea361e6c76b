//! Stepwise - ordered, idempotent provisioning steps.
//!
//! A definition lists named steps, each with an action and the steps it
//! depends on. Stepwise runs every step exactly once, after all of its
//! dependencies, and reports whether each one changed the system, found
//! it already in the desired state, failed, or was skipped.
//!
//! # Modules
//!
//! - [`actions`] - The `Action` trait and built-in actions
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Definition loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`runner`] - Dependency graph and step execution
//! - [`shell`] - Shell command execution
//! - [`steps`] - Steps, their states, and run results
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stepwise::actions::{FnAction, Outcome};
//! use stepwise::runner::{Executor, RunOptions};
//! use stepwise::shell::MockRunner;
//! use stepwise::steps::{Step, StepStatus};
//!
//! let steps = vec![
//!     Step::new("pkgmgr-update", FnAction::new("refresh", |_| Ok(Outcome::applied()))),
//!     Step::new("install-runtime", FnAction::new("install", |_| Ok(Outcome::already_satisfied())))
//!         .depends_on(["pkgmgr-update"]),
//! ];
//!
//! let executor = Executor::new(steps, Arc::new(MockRunner::new())).unwrap();
//! let report = executor.run(&RunOptions::default()).unwrap();
//!
//! assert_eq!(report.order(), vec!["pkgmgr-update", "install-runtime"]);
//! assert!(report.results.iter().all(|r| r.status == StepStatus::Succeeded));
//! assert_eq!(report.exit_code(), 0);
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{Result, StepwiseError};
