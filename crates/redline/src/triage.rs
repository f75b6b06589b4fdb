//! Failure payloads for the bug triage engine.
//!
//! One payload per failed case, in the shape the triage engine ingests.
//! Posting them is left to the caller.

use crate::harness::{RunResults, TestResult};
use crate::reporter::stack_trace;
use crate::result::RedlineResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Labels attached to every payload
pub const DEFAULT_LABELS: [&str; 2] = ["playwright", "automated"];

/// Matcher fragments and the labels they map to
const ASSERTION_LABELS: [(&str, &str, &str); 12] = [
    ("tohavetitle", "to have title", "Assertion: Title Mismatch"),
    ("tobevisible", "to be visible", "Assertion: Element Not Visible"),
    ("tohaveurl", "to have url", "Assertion: URL Mismatch"),
    ("tohavetext", "to have text", "Assertion: Text Mismatch"),
    ("tohavecount", "to have count", "Assertion: Count Mismatch"),
    ("tocontaintext", "to contain text", "Assertion: Missing Text"),
    ("tobeenabled", "to be enabled", "Assertion: Element Not Enabled"),
    ("tobedisabled", "to be disabled", "Assertion: Element Not Disabled"),
    ("tobechecked", "to be checked", "Assertion: Checkbox Not Checked"),
    ("tohavevalue", "to have value", "Assertion: Value Mismatch"),
    ("tohaveattribute", "to have attribute", "Assertion: Attribute Mismatch"),
    ("tobeattached", "to be attached", "Assertion: Element Not Attached"),
];

/// Fallback patterns for failures that never reached an assertion
const ERROR_LABELS: [(&[&str], &str); 6] = [
    (&["timeout", "timed out"], "Timeout Error"),
    (&["not found", "unable to locate"], "Element Not Found"),
    (&["navigation", "goto", "err_name_not_resolved"], "Navigation Error"),
    (&["network", "request failed"], "Network Error"),
    (&["click", "input simulation"], "Click Action Failed"),
    (&["page closed", "page crashed"], "Page Crash"),
];

/// Classify a failure message
///
/// Playwright matcher names win; otherwise the first matching error pattern;
/// otherwise "Test Failure".
#[must_use]
pub fn detect_label(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    ASSERTION_LABELS
        .iter()
        .find(|(camel, spaced, _)| lower.contains(camel) || lower.contains(spaced))
        .map(|(_, _, label)| *label)
        .or_else(|| {
            ERROR_LABELS
                .iter()
                .find(|(patterns, _)| patterns.iter().any(|p| lower.contains(p)))
                .map(|(_, label)| *label)
        })
        .unwrap_or("Test Failure")
}

/// One failed case, as the triage engine ingests it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePayload {
    /// Case title
    pub test_name: String,
    /// Fixture file name
    pub file_path: String,
    /// Failure message
    pub error_message: String,
    /// Stack trace
    pub stack_trace: String,
    /// Newline-joined log lines
    pub logs: String,
    /// Static labels
    pub labels: Vec<String>,
    /// Assertion-type label
    pub triage_label: String,
}

impl FailurePayload {
    /// Build a payload for a failed case, `None` otherwise
    #[must_use]
    pub fn from_result(result: &TestResult, at: DateTime<Utc>) -> Option<Self> {
        let message = result.failure_message()?;
        let file_path = Path::new(&result.file)
            .file_name()
            .map_or_else(|| result.file.clone(), |f| f.to_string_lossy().into_owned());

        let triage_label = result
            .outcome
            .as_ref()
            .filter(|o| !o.passed)
            .map_or_else(|| detect_label(message), |o| o.kind.triage_label());

        let mut logs = vec![
            format!("[{}] Test: {}", at.format("%Y-%m-%d %H:%M:%S"), result.name),
            format!("Status: {}", result.status),
            format!("Duration: {}ms", result.duration.as_millis()),
        ];
        logs.extend(result.log.iter().map(|step| format!("Step: {step}")));
        logs.push(format!("Error: {message}"));

        Some(Self {
            test_name: result.name.clone(),
            error_message: message.to_string(),
            stack_trace: stack_trace(message, &file_path),
            file_path,
            logs: logs.join("\n"),
            labels: DEFAULT_LABELS.iter().map(|l| (*l).to_string()).collect(),
            triage_label: triage_label.to_string(),
        })
    }
}

/// Payloads for every failed case of a run, in run order
#[must_use]
pub fn failures(run: &RunResults) -> Vec<FailurePayload> {
    run.results
        .iter()
        .filter_map(|r| FailurePayload::from_result(r, run.started_at))
        .collect()
}

/// Write failure payloads as a JSON array, returning how many were written
///
/// # Errors
///
/// Returns error if the file cannot be written
pub fn write_failures(run: &RunResults, path: &Path) -> RedlineResult<usize> {
    let payloads = failures(run);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&payloads)?)?;
    tracing::debug!(path = %path.display(), count = payloads.len(), "failure payloads written");
    Ok(payloads.len())
}
