//! Log classification and summary rendering

use crate::common::{rule, tail};

/// Returned when there were no lines at all
pub const NO_LOGS_FOUND: &str =
    "No WPEFramework logs found. WPEFramework may not be running or logs are not accessible.";

const MAX_ERRORS: usize = 20;
const MAX_WARNINGS: usize = 15;
const MAX_RELATED: usize = 20;
const MAX_RECENT: usize = 10;

/// Log lines sorted by severity
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Classified {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Lines mentioning the marker token that are neither errors nor warnings
    pub related: Vec<String>,
}

/// Sort lines into buckets; blank lines are dropped and the rest trimmed
///
/// `ERR` also catches `ERROR` and `WARN` catches `WARNING`; both checks
/// ignore case. The marker check does not.
pub fn classify<S: AsRef<str>>(lines: &[S], marker: &str) -> Classified {
    let mut classified = Classified::default();
    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        let upper = line.to_uppercase();
        if upper.contains("ERR") {
            classified.errors.push(line.to_string());
        } else if upper.contains("WARN") {
            classified.warnings.push(line.to_string());
        } else if !marker.is_empty() && line.contains(marker) {
            classified.related.push(line.to_string());
        }
    }
    classified
}

/// Render the summary attached to a failed test
pub fn summarize<S: AsRef<str>>(lines: &[S], test_id: Option<&str>, marker: &str) -> String {
    if lines.is_empty() {
        return NO_LOGS_FOUND.to_string();
    }

    let classified = classify(lines, marker);
    let mut out: Vec<String> = Vec::new();

    if let Some(id) = test_id.filter(|id| !id.is_empty()) {
        out.push(format!("\n{}", rule('=')));
        out.push(format!("WPEFramework Logs for Test Case: {id}"));
        out.push(format!("{}\n", rule('=')));
    }

    let mut section = |title: &str, items: &[String]| {
        out.push(title.to_string());
        out.push(rule('-'));
        out.extend(items.iter().cloned());
        out.push(String::new());
    };

    let has_severity = !classified.errors.is_empty() || !classified.warnings.is_empty();
    if !classified.errors.is_empty() {
        section("ERROR Logs:", tail(&classified.errors, MAX_ERRORS));
    }
    if !classified.warnings.is_empty() {
        section("WARNING Logs:", tail(&classified.warnings, MAX_WARNINGS));
    }
    if !has_severity && !classified.related.is_empty() {
        section(
            &format!("{marker} Related Logs:"),
            tail(&classified.related, MAX_RELATED),
        );
    }

    if !has_severity && classified.related.is_empty() {
        out.push("No ERROR or WARNING logs found in WPEFramework output.".to_string());
        out.push("Recent log entries:".to_string());
        out.push(rule('-'));
        out.extend(
            tail(lines, MAX_RECENT)
                .iter()
                .map(|line| line.as_ref().trim())
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    out.push(format!("{}\n", rule('=')));
    out.join("\n")
}
