//! GitHub Actions annotations and plain-text failure summaries.

use std::fmt::Write;

use crate::failures::{truncate_message, FailureRecord, MAX_MESSAGE_LENGTH};

const RULE_WIDTH: usize = 60;

/// Escape a workflow-command message. `%` goes first so the `%0D`/`%0A`
/// introduced afterwards are not escaped again.
pub fn escape_annotation(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// `::error title=<test id>::[<device>] <message>`
pub fn format_annotation(failure: &FailureRecord) -> String {
    let message = truncate_message(&failure.message, MAX_MESSAGE_LENGTH);
    let body = match failure.device.as_deref() {
        Some(device) if !device.is_empty() => format!("[{}] {}", device, message),
        _ => message,
    };
    format!(
        "::error title={}::{}",
        failure.test_identifier(),
        escape_annotation(&body)
    )
}

/// Numbered summary block, or `None` when there are no failures.
pub fn format_summary(failures: &[FailureRecord]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }

    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "TEST FAILURES SUMMARY");
    let _ = writeln!(out, "{}", rule);

    for (i, failure) in failures.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", i + 1, failure.test_identifier());
        if let Some(device) = failure.device.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "   Device: {}", device);
        }
        let _ = writeln!(
            out,
            "   Message: {}",
            truncate_message(&failure.message, MAX_MESSAGE_LENGTH)
        );
    }

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "Total failures: {}", failures.len());
    let _ = writeln!(out, "{}\n", rule);
    Some(out)
}
