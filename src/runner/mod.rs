//! Step execution orchestration.

pub mod cancel;
pub mod dependency;
pub mod executor;
pub mod parallel;

pub use cancel::{cancel_on_interrupt, CancellationToken};
pub use dependency::{DependencyGraph, DependencyGraphBuilder};
pub use executor::{Executor, FailurePolicy, RunOptions, RunProgress};
pub use parallel::ResourceLocks;
