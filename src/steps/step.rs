//! Runtime step: a named action with its dependencies.

use std::collections::HashMap;
use std::fmt;

use crate::actions::{self, Action};
use crate::config::StepConfig;

/// A step ready to be executed.
pub struct Step {
    /// Unique step name.
    pub name: String,

    /// Display title, if different from the name.
    pub title: Option<String>,

    /// Steps that must succeed first.
    pub depends_on: Vec<String>,

    /// What the step does.
    pub action: Box<dyn Action>,

    /// Lock overriding the action's own.
    pub lock: Option<String>,

    /// Extra attempts after a failure.
    pub retry: u32,

    /// Step-specific environment.
    pub env: HashMap<String, String>,
}

impl Step {
    /// Create a step with no dependencies.
    pub fn new(name: impl Into<String>, action: impl Action + 'static) -> Self {
        Self {
            name: name.into(),
            title: None,
            depends_on: Vec::new(),
            action: Box::new(action),
            lock: None,
            retry: 0,
            env: HashMap::new(),
        }
    }

    /// Build from a step definition.
    pub fn from_config(config: &StepConfig) -> Self {
        Self {
            name: config.name.clone(),
            title: config.title.clone(),
            depends_on: config.depends_on.clone(),
            action: actions::from_config(&config.action),
            lock: config.lock.clone(),
            retry: config.retry,
            env: config.env.clone(),
        }
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_lock(mut self, lock: impl Into<String>) -> Self {
        self.lock = Some(lock.into());
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Lock the step must hold while running, if any.
    pub fn effective_lock(&self) -> Option<&str> {
        self.lock.as_deref().or_else(|| self.action.lock())
    }

    /// Title for display, falling back to the name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("action", &self.action.describe())
            .field("lock", &self.effective_lock())
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{CommandAction, PACKAGE_LOCK};
    use crate::config::{ActionConfig, PackageManager};

    #[test]
    fn from_config_carries_fields() {
        let mut config = StepConfig::new(
            "install-runtime",
            ActionConfig::Package {
                manager: PackageManager::Apt,
                packages: vec!["golang".into()],
            },
        )
        .with_depends_on(["pkgmgr-update"]);
        config.retry = 2;
        config.title = Some("Install Go".into());

        let step = Step::from_config(&config);

        assert_eq!(step.name, "install-runtime");
        assert_eq!(step.depends_on, vec!["pkgmgr-update"]);
        assert_eq!(step.retry, 2);
        assert_eq!(step.display_title(), "Install Go");
        assert_eq!(step.effective_lock(), Some(PACKAGE_LOCK));
    }

    #[test]
    fn explicit_lock_overrides_action_lock() {
        let step = Step::new("build", CommandAction::new("make", None));
        assert_eq!(step.effective_lock(), None);

        let step = step.with_lock("gopath");
        assert_eq!(step.effective_lock(), Some("gopath"));
    }

    #[test]
    fn debug_shows_action_description() {
        let step = Step::new("hello", CommandAction::new("echo hi", None)).depends_on(["a"]);
        let debug = format!("{:?}", step);
        assert!(debug.contains("run `echo hi`"));
        assert!(debug.contains("\"a\""));
    }
}
