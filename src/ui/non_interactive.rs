//! Non-interactive UI for CI/headless environments.

use crate::steps::RunReport;

use super::progress::{failed_steps, summary_lines};
use super::theme::StepwiseTheme;
use super::{OutputMode, SpinnerHandle, UserInterface};

/// UI implementation for non-interactive mode.
///
/// Spinners degrade to a plain line when the step starts and another
/// when it finishes, which keeps CI logs readable.
pub struct NonInteractiveUI {
    mode: OutputMode,
    theme: StepwiseTheme,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            theme: StepwiseTheme::plain(),
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("{}", self.theme.format_warning(msg));
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn skipped(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_skipped(msg));
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_steps() {
            println!("  {}", message);
        }
        Box::new(NoopSpinner {
            visible: self.mode.shows_steps(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", self.theme.format_header(title));
        }
    }

    fn show_run_summary(&mut self, report: &RunReport) {
        if !self.mode.shows_status() {
            return;
        }

        println!();
        for line in summary_lines(report, &self.theme) {
            println!("{}", line);
        }

        if report.success() {
            println!("  {}", self.theme.format_success("Run complete"));
        } else {
            let failed = failed_steps(report);
            if failed.is_empty() {
                println!("  {}", self.theme.format_skipped("Run incomplete"));
            } else {
                eprintln!(
                    "  {}",
                    self.theme
                        .format_error(&format!("Run failed: {}", failed.join(", ")))
                );
            }
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that prints its final state only.
struct NoopSpinner {
    visible: bool,
}

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.visible {
            println!("  {}", StepwiseTheme::plain().format_success(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("  {}", StepwiseTheme::plain().format_error(msg));
    }

    fn finish_skipped(&mut self, msg: &str) {
        if self.visible {
            println!("  {}", StepwiseTheme::plain().format_skipped(msg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::RunResult;
    use std::time::Duration;

    #[test]
    fn non_interactive_is_not_interactive() {
        let ui = NonInteractiveUI::new(OutputMode::Normal);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn output_mode_preserved() {
        let ui = NonInteractiveUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn noop_spinner_methods() {
        let mut spinner = NoopSpinner { visible: false };
        spinner.set_message("test");
        spinner.finish_success("done");
        spinner.finish_error("failed");
        spinner.finish_skipped("skipped");
    }

    #[test]
    fn summary_in_silent_mode_is_quiet() {
        let mut ui = NonInteractiveUI::new(OutputMode::Silent);
        let report = RunReport {
            results: vec![RunResult::skipped("a", "cancelled")],
            started_at: chrono::Utc::now(),
            duration: Duration::ZERO,
            dry_run: false,
        };
        ui.show_run_summary(&report);
    }
}
