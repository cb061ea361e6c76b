//! Step definition validation rules.
//!
//! This module validates a definition for correctness:
//! - Step names must be present, well-formed, and unique
//! - depends_on must reference existing steps, never the step itself
//! - Actions must have their required fields filled in
//! - No circular dependencies allowed

use crate::config::schema::{ActionConfig, StepDefinition};
use crate::error::{Result, StepwiseError};
use crate::runner::dependency::DependencyGraph;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Step name if error is step-specific
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Missing dependency name or rendered cycle, when the rule has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

impl ValidationError {
    fn for_step(rule: &str, step: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            step: Some(step.to_string()),
            related: None,
        }
    }

    fn with_related(mut self, related: impl Into<String>) -> Self {
        self.related = Some(related.into());
        self
    }

    /// Convert into the matching fatal error.
    pub fn into_error(self) -> StepwiseError {
        let step = self.step.clone().unwrap_or_default();
        match self.rule.as_str() {
            "duplicate-step" => StepwiseError::DuplicateStep { step },
            "unknown-dependency" => StepwiseError::UnknownDependency {
                step,
                dependency: self.related.unwrap_or_default(),
            },
            "self-dependency" | "circular-dependency" => StepwiseError::CircularDependency {
                cycle: self.related.unwrap_or(step),
            },
            _ => StepwiseError::DefinitionValidationError {
                message: self.message,
            },
        }
    }
}

static STEP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:-]*$").expect("valid regex"));

/// Validate a definition and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate(definition: &StepDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_steps(definition));
    errors.extend(validate_settings(definition));
    errors.extend(validate_dependencies(definition));

    errors
}

/// Validate and fail with the first error, mapped to its error kind.
///
/// Unknown dependencies surface as `UnknownDependency`, cycles as
/// `CircularDependency`, duplicates as `DuplicateStep`.
pub fn validate_strict(definition: &StepDefinition) -> Result<()> {
    match validate(definition).into_iter().next() {
        Some(error) => Err(error.into_error()),
        None => Ok(()),
    }
}

fn validate_steps(definition: &StepDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let names: HashSet<&str> = definition.steps.iter().map(|s| s.name.as_str()).collect();
    let mut seen = HashSet::new();

    for step in &definition.steps {
        let name = step.name.as_str();

        if name.trim().is_empty() {
            errors.push(ValidationError::for_step(
                "empty-name",
                name,
                "Step name must not be empty".to_string(),
            ));
        } else if !STEP_NAME.is_match(name) {
            errors.push(ValidationError::for_step(
                "invalid-name",
                name,
                format!(
                    "Step name '{}' may only contain letters, digits, '_', '.', ':' and '-'",
                    name
                ),
            ));
        }

        if !seen.insert(name) {
            errors.push(ValidationError::for_step(
                "duplicate-step",
                name,
                format!("Step '{}' is defined more than once", name),
            ));
        }

        for dep in &step.depends_on {
            if dep == name {
                errors.push(
                    ValidationError::for_step(
                        "self-dependency",
                        name,
                        format!("Step '{}' depends on itself", name),
                    )
                    .with_related(format!("{} -> {}", name, name)),
                );
            } else if !names.contains(dep.as_str()) {
                errors.push(
                    ValidationError::for_step(
                        "unknown-dependency",
                        name,
                        format!("Step '{}' depends on '{}' which does not exist", name, dep),
                    )
                    .with_related(dep.clone()),
                );
            }
        }

        errors.extend(validate_action(name, &step.action));
    }

    errors
}

fn validate_action(name: &str, action: &ActionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match action {
        ActionConfig::Command { command, .. } => {
            if command.trim().is_empty() {
                errors.push(ValidationError::for_step(
                    "empty-command",
                    name,
                    format!("Step '{}' has an empty command", name),
                ));
            }
        }
        ActionConfig::Package { packages, .. } => {
            if packages.is_empty() || packages.iter().any(|p| p.trim().is_empty()) {
                errors.push(ValidationError::for_step(
                    "empty-packages",
                    name,
                    format!("Step '{}' must list at least one non-empty package", name),
                ));
            }
        }
        ActionConfig::PackageUpdate { .. } => {}
        ActionConfig::Service { service, .. } => {
            if service.trim().is_empty() {
                errors.push(ValidationError::for_step(
                    "empty-service",
                    name,
                    format!("Step '{}' must name a service", name),
                ));
            }
        }
        ActionConfig::File { path, mode, .. } => {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::for_step(
                    "empty-path",
                    name,
                    format!("Step '{}' must name a file path", name),
                ));
            }
            if let Some(mode) = mode {
                if u32::from_str_radix(mode, 8).is_err() {
                    errors.push(ValidationError::for_step(
                        "invalid-mode",
                        name,
                        format!("Step '{}' has invalid octal mode '{}'", name, mode),
                    ));
                }
            }
        }
    }

    errors
}

fn validate_settings(definition: &StepDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if definition.settings.max_parallel == 0 {
        errors.push(ValidationError {
            rule: "invalid-max-parallel".to_string(),
            message: "settings.max_parallel must be at least 1".to_string(),
            step: None,
            related: None,
        });
    }

    errors
}

/// Look for a cycle among known, non-self dependencies.
///
/// Self dependencies and unknown names are reported by their own rules.
fn validate_dependencies(definition: &StepDefinition) -> Vec<ValidationError> {
    let names: HashSet<&str> = definition.steps.iter().map(|s| s.name.as_str()).collect();
    let mut seen = HashSet::new();
    let mut builder = DependencyGraph::builder();

    for step in &definition.steps {
        if !seen.insert(step.name.as_str()) {
            continue;
        }
        let deps: Vec<String> = step
            .depends_on
            .iter()
            .filter(|d| *d != &step.name && names.contains(d.as_str()))
            .cloned()
            .collect();
        builder = builder.add_step(step.name.clone(), deps);
    }

    let graph = match builder.build() {
        Ok(graph) => graph,
        Err(_) => return Vec::new(),
    };

    match graph.find_cycle() {
        Some(cycle) => {
            let rendered = cycle.join(" -> ");
            vec![ValidationError {
                rule: "circular-dependency".to_string(),
                message: format!("Circular dependency detected: {}", rendered),
                step: cycle.first().cloned(),
                related: Some(rendered),
            }]
        }
        None => Vec::new(),
    }
}
