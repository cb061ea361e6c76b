//! Step progress formatting.

use std::time::Duration;

use crate::steps::{RunReport, RunResult, StepStatus};

use super::theme::StepwiseTheme;

/// Format a duration for display.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}

/// One-line description of what happened to a step.
///
/// Succeeded steps show their outcome detail, or "applied" / "already
/// satisfied" when the action gave none. Failed and skipped steps show
/// their cause.
pub fn result_detail(result: &RunResult) -> String {
    match result.status {
        StepStatus::Succeeded => match &result.outcome {
            Some(outcome) => match outcome.detail() {
                Some(detail) => detail.to_string(),
                None if outcome.is_applied() => "applied".to_string(),
                None => "already satisfied".to_string(),
            },
            None => "succeeded".to_string(),
        },
        StepStatus::Failed | StepStatus::Skipped => result
            .error
            .clone()
            .unwrap_or_else(|| result.status.to_string()),
    }
}

/// Lines of the boxed run summary, without the final status line.
pub fn summary_lines(report: &RunReport, theme: &StepwiseTheme) -> Vec<String> {
    let border = |s: &str| theme.border.apply_to(s).to_string();
    let title = if report.dry_run {
        "┌─ Summary (dry run) ────────────────"
    } else {
        "┌─ Summary ──────────────────────────"
    };

    let mut lines = vec![format!("  {}", border(title))];
    for result in &report.results {
        let icon = match result.status {
            StepStatus::Succeeded => theme.success.apply_to(result.status.display_char()),
            StepStatus::Failed => theme.error.apply_to(result.status.display_char()),
            StepStatus::Skipped => theme.dim.apply_to(result.status.display_char()),
        };
        let right_side = match result.status {
            StepStatus::Skipped => theme.dim.apply_to(result_detail(result)).to_string(),
            _ => theme
                .duration
                .apply_to(format_duration(result.duration))
                .to_string(),
        };
        lines.push(format!(
            "  {} {} {:<24} {}",
            border("│"),
            icon,
            result.step_name,
            right_side
        ));
    }

    let counts = report.counts();
    lines.push(format!("  {}", border("├────────────────────────────────────")));
    lines.push(format!(
        "  {} Total: {} · {} succeeded · {} failed · {} skipped",
        border("│"),
        format_duration(report.duration),
        counts.succeeded,
        counts.failed,
        counts.skipped,
    ));
    lines.push(format!("  {}", border("└────────────────────────────────────")));
    lines
}

/// Names of the steps that failed, in result order.
pub fn failed_steps(report: &RunReport) -> Vec<&str> {
    report
        .results
        .iter()
        .filter(|r| r.status == StepStatus::Failed)
        .map(|r| r.step_name.as_str())
        .collect()
}
