//! Completed check implementations.
//!
//! Completed checks let a command step detect that its effect is already
//! in place, so a rerun reports it as already satisfied instead of running
//! the command again.

use crate::config::CompletedCheck;
use crate::shell::{CommandOptions, CommandRunner};
use std::path::Path;

/// Result of running a completed check.
///
/// The `description` field is user-visible: it becomes the detail of an
/// already-satisfied outcome. Use
/// [`short_description`](CheckResult::short_description) to get a
/// display-friendly form with prefixes like "Command succeeded:" stripped.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Whether the check passed (work is already done).
    pub complete: bool,

    /// Description of what was checked.
    pub description: String,

    /// Details about the check result.
    pub details: Option<String>,
}

impl CheckResult {
    /// Create a complete result.
    pub fn complete(description: impl Into<String>) -> Self {
        Self {
            complete: true,
            description: description.into(),
            details: None,
        }
    }

    /// Create an incomplete result.
    pub fn incomplete(description: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            complete: false,
            description: description.into(),
            details: Some(details.into()),
        }
    }

    /// Get a short, display-friendly description with common prefixes stripped.
    pub fn short_description(&self) -> &str {
        const PREFIXES: &[&str] = &[
            "Command succeeded: ",
            "Command failed: ",
            "File exists: ",
            "File missing: ",
            "Check passed: ",
        ];
        for prefix in PREFIXES {
            if let Some(rest) = self.description.strip_prefix(prefix) {
                return rest;
            }
        }
        &self.description
    }
}

/// Run a completed check.
///
/// Relative file paths resolve against `base_dir`, and commands run there
/// through `runner`.
pub fn run_check(
    check: &CompletedCheck,
    base_dir: &Path,
    runner: &dyn CommandRunner,
    options: &CommandOptions,
) -> CheckResult {
    match check {
        CompletedCheck::FileExists { path } => check_file_exists(path, base_dir),
        CompletedCheck::CommandSucceeds { command } => {
            check_command_succeeds(command, runner, options)
        }
        CompletedCheck::All { checks } => check_all(checks, base_dir, runner, options),
        CompletedCheck::Any { checks } => check_any(checks, base_dir, runner, options),
    }
}

fn check_file_exists(path: &str, base_dir: &Path) -> CheckResult {
    let full_path = if Path::new(path).is_absolute() {
        Path::new(path).to_path_buf()
    } else {
        base_dir.join(path)
    };

    if full_path.exists() {
        CheckResult::complete(format!("File exists: {}", path))
    } else {
        CheckResult::incomplete(
            format!("File missing: {}", path),
            format!("Expected at: {}", full_path.display()),
        )
    }
}

fn check_command_succeeds(
    command: &str,
    runner: &dyn CommandRunner,
    options: &CommandOptions,
) -> CheckResult {
    if runner.check(command, options) {
        CheckResult::complete(format!("Command succeeded: {}", truncate(command, 50)))
    } else {
        CheckResult::incomplete(
            format!("Command failed: {}", truncate(command, 50)),
            "Exit code was non-zero".to_string(),
        )
    }
}

fn check_all(
    checks: &[CompletedCheck],
    base_dir: &Path,
    runner: &dyn CommandRunner,
    options: &CommandOptions,
) -> CheckResult {
    let mut failed = Vec::new();
    for check in checks {
        let result = run_check(check, base_dir, runner, options);
        if !result.complete {
            failed.push(result.description);
        }
    }

    if failed.is_empty() {
        CheckResult::complete(format!("All {} checks passed", checks.len()))
    } else {
        CheckResult::incomplete(
            format!("{}/{} checks failed", failed.len(), checks.len()),
            failed.join("; "),
        )
    }
}

fn check_any(
    checks: &[CompletedCheck],
    base_dir: &Path,
    runner: &dyn CommandRunner,
    options: &CommandOptions,
) -> CheckResult {
    let mut missed = Vec::new();
    for check in checks {
        let result = run_check(check, base_dir, runner, options);
        if result.complete {
            return CheckResult::complete(format!("Check passed: {}", result.description));
        }
        missed.push(result.description);
    }

    CheckResult::incomplete(
        format!("None of {} checks passed", checks.len()),
        missed.join("; "),
    )
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
