//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! Commands are dispatched via [`CommandDispatcher`]. A bare
//! `stepwise [DEFINITION]` is the same as `stepwise run [DEFINITION]`.

pub mod completions;
pub mod dispatcher;
pub mod display;
pub mod plan;
pub mod run;
pub mod schema;
pub mod validate;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
