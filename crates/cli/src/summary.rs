// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Final session report rendered after a sync.

use crate::color::{paint, BOLD, GREEN, RED, YELLOW};
use pcs_core::{format_elapsed, JobStatus, SessionStatus};
use pcs_engine::SessionSummary;

fn status_color(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Completed => GREEN,
        SessionStatus::Interrupted => YELLOW,
        _ => RED,
    }
}

fn job_status_color(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Success => GREEN,
        JobStatus::Skipped => YELLOW,
        JobStatus::Failed => RED,
    }
}

/// Render the summary block shown after every run.
pub fn render(summary: &SessionSummary, colorize: bool) -> String {
    let session = &summary.session;
    let mut out = String::new();

    out.push('\n');
    out.push_str(&paint("Sync Summary", BOLD, colorize));
    out.push('\n');

    let mut row = |label: &str, value: String| {
        out.push_str(&format!("  {label:<16} {value}\n"));
    };

    row("Session ID", session.id.clone());
    row(
        "Status",
        paint(
            &session.status.to_string().to_uppercase(),
            status_color(session.status),
            colorize,
        ),
    );
    if let Some(duration) = session.duration() {
        row(
            "Duration",
            format_elapsed(duration.num_seconds().max(0) as u64),
        );
    }
    row("Jobs executed", session.job_results.len().to_string());
    row("Log file", summary.log_path.display().to_string());
    if summary.dropped_events > 0 {
        row(
            "Dropped events",
            format!("{} (sink queues were full)", summary.dropped_events),
        );
    }

    if !session.job_results.is_empty() {
        out.push('\n');
        for result in &session.job_results {
            let status = paint(
                &result.status.to_string().to_uppercase(),
                job_status_color(result.status),
                colorize,
            );
            out.push_str(&format!("  {:<24} {status}", result.job_name));
            if let Some(message) = &result.error_message {
                out.push_str(&format!("  {message}"));
            }
            out.push('\n');
        }
    }

    let failed: Vec<&str> = session
        .job_results
        .iter()
        .filter(|r| r.status == JobStatus::Failed)
        .map(|r| r.job_name.as_str())
        .collect();
    if !failed.is_empty() {
        out.push('\n');
        out.push_str(&paint(
            &format!("  Failed jobs: {}", failed.join(", ")),
            RED,
            colorize,
        ));
        out.push('\n');
    }
    if let Some(error) = &session.error_message {
        out.push_str(&paint(&format!("  Error: {error}"), RED, colorize));
        out.push('\n');
    }

    out
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
