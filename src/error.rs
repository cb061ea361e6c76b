//! Error types for stepwise operations.
//!
//! This module defines [`StepwiseError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Definition problems (parse, validation, cycles, unknown dependencies)
//!   are fatal and surface before any step runs
//! - A failing action is recorded in its step's run result rather than
//!   aborting the run; [`StepwiseError::ActionFailed`] is how it is reported
//! - Use `anyhow::Error` (via `StepwiseError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stepwise operations.
#[derive(Debug, Error)]
pub enum StepwiseError {
    /// Step definition file not found.
    #[error("Step definition not found: {path}")]
    DefinitionNotFound { path: PathBuf },

    /// Failed to parse a step definition file.
    #[error("Failed to parse step definition at {path}: {message}")]
    DefinitionParseError { path: PathBuf, message: String },

    /// Invalid definition structure or values.
    #[error("Invalid step definition: {message}")]
    DefinitionValidationError { message: String },

    /// Two steps share a name.
    #[error("Duplicate step name: '{step}'")]
    DuplicateStep { step: String },

    /// A step depends on a step that does not exist.
    #[error("Step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    /// Step dependency cycle detected.
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// A step's action failed.
    #[error("Step '{step}' failed: {message}")]
    ActionFailed { step: String, message: String },

    /// Shell command could not be started.
    #[error("Could not start command '{command}': {source}")]
    CommandSpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepwiseError {
    /// Whether this error rejects the definition before anything runs.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            StepwiseError::DefinitionNotFound { .. }
                | StepwiseError::DefinitionParseError { .. }
                | StepwiseError::DefinitionValidationError { .. }
                | StepwiseError::DuplicateStep { .. }
                | StepwiseError::UnknownDependency { .. }
                | StepwiseError::CircularDependency { .. }
        )
    }
}

/// Result type alias for stepwise operations.
pub type Result<T> = std::result::Result<T, StepwiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_not_found_displays_path() {
        let err = StepwiseError::DefinitionNotFound {
            path: PathBuf::from("/srv/provision.yml"),
        };
        assert!(err.to_string().contains("/srv/provision.yml"));
    }

    #[test]
    fn parse_error_displays_path_and_message() {
        let err = StepwiseError::DefinitionParseError {
            path: PathBuf::from("/steps.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/steps.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn spawn_failure_keeps_io_reason() {
        let err = StepwiseError::CommandSpawnFailed {
            command: "apt-get update".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such shell"),
        };
        assert!(err.to_string().contains("apt-get update"));
        assert!(err.to_string().contains("no such shell"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn unknown_dependency_names_step_and_dependency() {
        let err = StepwiseError::UnknownDependency {
            step: "restart-service".into(),
            dependency: "install-runtime".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("restart-service"));
        assert!(msg.contains("install-runtime"));
    }

    #[test]
    fn circular_dependency_displays_cycle() {
        let err = StepwiseError::CircularDependency {
            cycle: "a -> b -> a".into(),
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn action_failed_displays_step_and_message() {
        let err = StepwiseError::ActionFailed {
            step: "install-runtime".into(),
            message: "apt-get exited with code 100".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("install-runtime"));
        assert!(msg.contains("apt-get exited with code 100"));
    }

    #[test]
    fn definition_errors_are_classified() {
        assert!(StepwiseError::DuplicateStep { step: "a".into() }.is_definition_error());
        assert!(StepwiseError::CircularDependency { cycle: "a".into() }.is_definition_error());
        assert!(!StepwiseError::ActionFailed {
            step: "a".into(),
            message: "boom".into()
        }
        .is_definition_error());
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: StepwiseError = io_err.into();
        assert!(matches!(err, StepwiseError::Io(_)));
    }
}
