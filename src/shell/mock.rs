//! Recording command runner for tests.
//!
//! `MockRunner` implements [`CommandRunner`] without spawning processes.
//! Every command is recorded; responses are matched by prefix, falling
//! back to a configurable default.
//!
//! # Example
//!
//! ```
//! use stepwise::shell::{CommandOptions, CommandRunner, MockRunner};
//!
//! let runner = MockRunner::new();
//! runner.fail_on("dpkg -s golang");
//!
//! assert!(!runner.check("dpkg -s golang", &CommandOptions::default()));
//! assert!(runner.check("dpkg -s statsd", &CommandOptions::default()));
//! assert_eq!(runner.commands().len(), 2);
//! ```

use std::sync::Mutex;
use std::time::Duration;

use crate::error::Result;

use super::command::{CommandOptions, CommandResult, CommandRunner};

#[derive(Debug, Clone)]
struct Response {
    prefix: String,
    success: bool,
    stdout: String,
}

/// Mock runner that records commands and returns scripted results.
#[derive(Debug, Default)]
pub struct MockRunner {
    commands: Mutex<Vec<String>>,
    responses: Mutex<Vec<Response>>,
    default_success: bool,
}

impl MockRunner {
    /// Create a runner where every command succeeds unless scripted otherwise.
    pub fn new() -> Self {
        Self {
            default_success: true,
            ..Default::default()
        }
    }

    /// Create a runner where every command fails unless scripted otherwise.
    pub fn failing() -> Self {
        Self {
            default_success: false,
            ..Default::default()
        }
    }

    /// Commands starting with `prefix` succeed with `stdout`.
    pub fn succeed_on(&self, prefix: &str, stdout: &str) {
        self.push(prefix, true, stdout);
    }

    /// Commands starting with `prefix` fail.
    pub fn fail_on(&self, prefix: &str) {
        self.push(prefix, false, "");
    }

    fn push(&self, prefix: &str, success: bool, stdout: &str) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push(Response {
                prefix: prefix.to_string(),
                success,
                stdout: stdout.to_string(),
            });
        }
    }

    /// All commands run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Whether any recorded command starts with `prefix`.
    pub fn ran(&self, prefix: &str) -> bool {
        self.commands().iter().any(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &str, _options: &CommandOptions) -> Result<CommandResult> {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command.to_string());
        }

        // Most recently scripted response wins.
        let response = self.responses.lock().ok().and_then(|responses| {
            responses
                .iter()
                .rev()
                .find(|r| command.starts_with(&r.prefix))
                .cloned()
        });

        let (success, stdout) = match response {
            Some(r) => (r.success, r.stdout),
            None => (self.default_success, String::new()),
        };

        if success {
            Ok(CommandResult::success(stdout, String::new(), Duration::ZERO))
        } else {
            Ok(CommandResult::failure(
                Some(1),
                stdout,
                format!("mock failure: {}", command),
                Duration::ZERO,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runner_succeeds() {
        let runner = MockRunner::new();
        let result = runner.run("anything", &CommandOptions::default()).unwrap();
        assert!(result.success);
    }

    #[test]
    fn failing_runner_fails_by_default() {
        let runner = MockRunner::failing();
        assert!(!runner.check("anything", &CommandOptions::default()));
    }

    #[test]
    fn later_responses_override_earlier() {
        let runner = MockRunner::new();
        runner.fail_on("systemctl");
        runner.succeed_on("systemctl is-active", "active");

        assert!(runner.check("systemctl is-active statsd", &CommandOptions::default()));
        assert!(!runner.check("systemctl restart statsd", &CommandOptions::default()));
    }

    #[test]
    fn records_commands_in_order() {
        let runner = MockRunner::new();
        runner.check("first", &CommandOptions::default());
        runner.check("second", &CommandOptions::default());

        assert_eq!(runner.commands(), vec!["first", "second"]);
        assert!(runner.ran("sec"));
        assert!(!runner.ran("third"));
    }
}
