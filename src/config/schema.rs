//! Step definition schema.
//!
//! This module contains all the struct definitions that map to
//! the YAML step definition format.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root structure of a step definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StepDefinition {
    /// Name of what is being provisioned (display only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Definition version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Maintainer contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,

    /// Other definition files whose steps are included (each at most once)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<PathBuf>,

    /// Run settings
    pub settings: Settings,

    /// Steps in declaration order
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

impl StepDefinition {
    /// Look up a step by name.
    pub fn step(&self, name: &str) -> Option<&StepConfig> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Step names in declaration order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Settings that apply to a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    /// Attempt dependents of failed steps instead of skipping them
    #[serde(default, skip_serializing_if = "is_false")]
    pub continue_on_error: bool,

    /// Run independent steps concurrently
    #[serde(default, skip_serializing_if = "is_false")]
    pub parallel: bool,

    /// Maximum concurrent steps in parallel mode
    #[serde(
        default = "default_max_parallel",
        skip_serializing_if = "is_default_max_parallel"
    )]
    pub max_parallel: usize,

    /// Environment variables passed to every action
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            parallel: false,
            max_parallel: default_max_parallel(),
            env: HashMap::new(),
        }
    }
}

fn default_max_parallel() -> usize {
    4
}

fn is_default_max_parallel(v: &usize) -> bool {
    *v == default_max_parallel()
}

fn is_false(v: &bool) -> bool {
    !v
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// A single step definition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StepConfig {
    /// Unique step name
    pub name: String,

    /// Step title (for display)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Step description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Steps that must complete before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// What the step does
    pub action: ActionConfig,

    /// Shared resource this step must hold exclusively while running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<String>,

    /// Extra attempts after a failure
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retry: u32,

    /// Step-specific environment variables
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl StepConfig {
    /// Create a step with no dependencies.
    pub fn new(name: impl Into<String>, action: ActionConfig) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            depends_on: Vec::new(),
            action,
            lock: None,
            retry: 0,
            env: HashMap::new(),
        }
    }

    /// Add dependencies.
    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }
}

/// Action a step performs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionConfig {
    /// Run a shell command, unless a completed check says it already ran
    Command {
        /// Command to run
        command: String,

        /// Check whether the command's effect is already in place
        #[serde(default, skip_serializing_if = "Option::is_none")]
        check: Option<CompletedCheck>,
    },

    /// Install packages that are not installed yet
    Package {
        /// Package manager to use
        #[serde(default)]
        manager: PackageManager,

        /// Packages to install
        packages: Vec<String>,
    },

    /// Refresh the package index
    PackageUpdate {
        /// Package manager to use
        #[serde(default)]
        manager: PackageManager,
    },

    /// Control a system service
    Service {
        /// Service name
        service: String,

        /// What to do with the service
        #[serde(default)]
        operation: ServiceOperation,

        /// Service manager to use
        #[serde(default)]
        manager: ServiceManager,
    },

    /// Write a file when its content differs
    File {
        /// File path (relative paths resolve against the definition directory)
        path: PathBuf,

        /// Desired content
        content: String,

        /// Octal permission bits, e.g. "0644"
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
    },
}

impl ActionConfig {
    /// Short kind name as written in YAML.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionConfig::Command { .. } => "command",
            ActionConfig::Package { .. } => "package",
            ActionConfig::PackageUpdate { .. } => "package_update",
            ActionConfig::Service { .. } => "service",
            ActionConfig::File { .. } => "file",
        }
    }
}

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Apt,
    Dnf,
    Yum,
    Brew,
    Apk,
}

/// Operations on a system service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceOperation {
    /// Start if not running.
    Start,
    /// Stop if running.
    Stop,
    /// Restart, or start when not running.
    #[default]
    Restart,
    /// Reload configuration, or start when not running.
    Reload,
}

/// Supported service managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceManager {
    #[default]
    Systemd,
    /// The `service` wrapper around SysV init scripts.
    Sysv,
}

/// Completed check configuration.
///
/// This enables idempotent step execution by detecting when work
/// has already been done.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletedCheck {
    /// Check if a file or directory exists
    FileExists {
        /// Path to check (relative to the definition directory)
        path: String,
    },

    /// Check if a command succeeds (exit code 0)
    CommandSucceeds {
        /// Command to run
        command: String,
    },

    /// All checks must pass
    All {
        /// List of checks that must all pass
        checks: Vec<CompletedCheck>,
    },

    /// Any check passing is sufficient
    Any {
        /// List of checks where at least one must pass
        checks: Vec<CompletedCheck>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_definition() {
        let yaml = r#"
steps:
  - name: hello
    action:
      type: command
      command: echo hello
"#;
        let def: StepDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.steps.len(), 1);
        assert_eq!(def.steps[0].name, "hello");
        assert!(matches!(def.steps[0].action, ActionConfig::Command { .. }));
        assert_eq!(def.settings, Settings::default());
    }

    #[test]
    fn parses_metadata_and_settings() {
        let yaml = r#"
name: streambot-test-client
version: 0.0.1
maintainer: ops@example.com
settings:
  continue_on_error: true
  parallel: true
  max_parallel: 2
  env:
    DEBIAN_FRONTEND: noninteractive
"#;
        let def: StepDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.name.as_deref(), Some("streambot-test-client"));
        assert!(def.settings.continue_on_error);
        assert!(def.settings.parallel);
        assert_eq!(def.settings.max_parallel, 2);
        assert_eq!(
            def.settings.env.get("DEBIAN_FRONTEND"),
            Some(&"noninteractive".to_string())
        );
    }

    #[test]
    fn package_manager_defaults_to_apt() {
        let yaml = r#"
name: install-runtime
action:
  type: package
  packages: [golang]
"#;
        let step: StepConfig = serde_yaml::from_str(yaml).unwrap();
        match step.action {
            ActionConfig::Package { manager, packages } => {
                assert_eq!(manager, PackageManager::Apt);
                assert_eq!(packages, vec!["golang"]);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn service_defaults_to_systemd_restart() {
        let yaml = r#"
name: restart-statsd
action:
  type: service
  service: statsd
"#;
        let step: StepConfig = serde_yaml::from_str(yaml).unwrap();
        match step.action {
            ActionConfig::Service {
                service,
                operation,
                manager,
            } => {
                assert_eq!(service, "statsd");
                assert_eq!(operation, ServiceOperation::Restart);
                assert_eq!(manager, ServiceManager::Systemd);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn parses_nested_completed_check() {
        let yaml = r#"
name: go-deps
action:
  type: command
  command: go get github.com/example/lib
  check:
    type: any
    checks:
      - type: file_exists
        path: /opt/go/bin/lib
      - type: command_succeeds
        command: go list github.com/example/lib
"#;
        let step: StepConfig = serde_yaml::from_str(yaml).unwrap();
        match step.action {
            ActionConfig::Command {
                check: Some(CompletedCheck::Any { checks }),
                ..
            } => assert_eq!(checks.len(), 2),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        let yaml = r#"
name: bad
action:
  type: teleport
"#;
        assert!(serde_yaml::from_str::<StepConfig>(yaml).is_err());
    }

    #[test]
    fn action_kind_names_match_yaml_tags() {
        let action = ActionConfig::PackageUpdate {
            manager: PackageManager::Apt,
        };
        assert_eq!(action.kind(), "package_update");
        let yaml = serde_yaml::to_string(&action).unwrap();
        assert!(yaml.contains("type: package_update"));
    }

    #[test]
    fn builder_helpers_set_dependencies() {
        let step = StepConfig::new(
            "restart-service",
            ActionConfig::Service {
                service: "statsd".into(),
                operation: ServiceOperation::Restart,
                manager: ServiceManager::Systemd,
            },
        )
        .with_depends_on(["install-runtime"]);
        assert_eq!(step.depends_on, vec!["install-runtime"]);
    }
}
