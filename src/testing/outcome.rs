//! Verdicts and failure diagnostics
//!
//! Compares the observed response with the expectation. On failure the
//! framework logs are scraped and classified twice: a long excerpt for the
//! console and a shorter one that travels with the report row.

use std::sync::Arc;

use crate::common::config::{Config, LogsConfig};
use crate::common::logging;
use crate::logs::{summarize, LogScraper, NO_LOGS_FOUND};
use crate::report::Status;
use crate::rpc::Observed;

use super::config::{OutcomeMessages, ResponseExpectation};

/// Appended to the message when failure logs were printed
pub const LOGS_CAPTURED_NOTE: &str = "\n\nWPEFramework Error Logs captured. See above for details.";

/// Verdict plus what goes into the report
#[derive(Debug, Clone)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
    /// Classified logs for the report row, failures only
    pub report_logs: Option<String>,
}

/// Apply an expectation to the observed text
pub fn compare(expect: &ResponseExpectation, observed: &str) -> Status {
    if expect.equals.as_deref() == Some(observed) {
        return Status::Pass;
    }

    let folded = observed.to_lowercase();
    let matched = expect.contains.iter().any(|needle| observed.contains(needle.as_str()))
        || expect
            .contains_ignore_case
            .iter()
            .any(|needle| folded.contains(&needle.to_lowercase()));

    if matched {
        Status::Pass
    } else {
        Status::Fail
    }
}

/// Scrapes and classifies framework logs for a failed test
#[derive(Clone)]
pub struct LogCollector {
    scraper: Arc<LogScraper>,
    marker: String,
    display_lines: usize,
    report_lines: usize,
}

impl LogCollector {
    pub fn new(scraper: LogScraper, logs: &LogsConfig) -> Self {
        Self {
            scraper: Arc::new(scraper),
            marker: logs.marker.clone(),
            display_lines: logs.display_lines,
            report_lines: logs.report_lines,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            LogScraper::from_config(&config.logs, &config.services),
            &config.logs,
        )
    }

    /// Classified summary of the last `lines` lines
    ///
    /// Runs on its own task so a panic inside a probe turns into an inline
    /// message instead of taking the run down.
    pub async fn excerpt(&self, test_id: &str, lines: usize) -> String {
        let scraper = Arc::clone(&self.scraper);
        let marker = self.marker.clone();
        let id = test_id.to_string();

        let task = tokio::spawn(async move {
            let capture = scraper.scrape(lines).await;
            summarize(&capture.lines, Some(id.as_str()), &marker)
        });

        match task.await {
            Ok(summary) => summary,
            Err(e) => format!("Error capturing WPEFramework logs: {e}"),
        }
    }
}

/// Decide the verdict and gather diagnostics for a failure
pub async fn evaluate(
    test_id: &str,
    expect: &ResponseExpectation,
    observed: &Observed,
    messages: &OutcomeMessages,
    logs: &LogCollector,
) -> Outcome {
    let status = compare(expect, observed.as_str());
    if status == Status::Pass {
        return Outcome {
            status,
            message: messages.pass.clone(),
            report_logs: None,
        };
    }

    let mut message = messages.fail.clone();

    let shown = logs.excerpt(test_id, logs.display_lines).await;
    if !shown.contains(NO_LOGS_FOUND) {
        logging::error(&format!("\nWPEFramework Error Logs for {test_id}:"));
        println!("{shown}");
        message.push_str(LOGS_CAPTURED_NOTE);
    }

    let report_logs = logs.excerpt(test_id, logs.report_lines).await;

    Outcome {
        status,
        message,
        report_logs: Some(report_logs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LogProbe, ProbeOutcome};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const UNKNOWN_METHOD: &str =
        r#"{"jsonrpc":"2.0","id":42,"error":{"code":-32601,"message":"Unknown method."}}"#;

    struct CountingProbe {
        calls: Arc<AtomicUsize>,
        outcome: ProbeOutcome,
    }

    #[async_trait]
    impl LogProbe for CountingProbe {
        fn name(&self) -> String {
            "counting".to_string()
        }

        async fn probe(&self, _lines: usize) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct PanickingProbe;

    #[async_trait]
    impl LogProbe for PanickingProbe {
        fn name(&self) -> String {
            "panicking".to_string()
        }

        async fn probe(&self, _lines: usize) -> ProbeOutcome {
            panic!("probe exploded")
        }
    }

    fn collector(outcome: ProbeOutcome) -> (LogCollector, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = CountingProbe {
            calls: Arc::clone(&calls),
            outcome,
        };
        let scraper = LogScraper::new(vec![Box::new(probe)]);
        (LogCollector::new(scraper, &LogsConfig::default()), calls)
    }

    #[test]
    fn test_exact_match_passes() {
        let expect = ResponseExpectation::exact(r#"{"jsonrpc":"2.0","id":42,"result":{"success":true}}"#);
        assert_eq!(
            compare(&expect, r#"{"jsonrpc":"2.0","id":42,"result":{"success":true}}"#),
            Status::Pass
        );
    }

    #[test]
    fn test_key_order_matters() {
        let expect = ResponseExpectation::exact(r#"{"jsonrpc":"2.0","id":42,"result":{"success":true}}"#);
        assert_eq!(
            compare(&expect, r#"{"id":42,"jsonrpc":"2.0","result":{"success":true}}"#),
            Status::Fail
        );
    }

    #[test]
    fn test_whitespace_matters() {
        let expect = ResponseExpectation::exact(r#"{"jsonrpc":"2.0"}"#);
        assert_eq!(compare(&expect, r#"{"jsonrpc": "2.0"}"#), Status::Fail);
        assert_eq!(compare(&expect, "{\"jsonrpc\":\"2.0\"}\n"), Status::Fail);
    }

    #[test]
    fn test_contains_alternatives() {
        let expect = ResponseExpectation {
            equals: Some(r#"{"jsonrpc":"2.0","id":42,"result":{"success":false}}"#.to_string()),
            contains: vec!["false".to_string()],
            contains_ignore_case: vec!["error".to_string()],
        };
        assert_eq!(
            compare(&expect, r#"{"jsonrpc":"2.0","id":42,"ERROR":{"code":1}}"#),
            Status::Pass
        );
        assert_eq!(
            compare(&expect, r#"{"jsonrpc":"2.0","id":42,"result":{"success":false}}"#),
            Status::Pass
        );
        assert_eq!(
            compare(&expect, r#"{"jsonrpc":"2.0","id":42,"result":{"success":true}}"#),
            Status::Fail
        );
    }

    #[test]
    fn test_case_folding_applies_only_to_its_own_list() {
        let expect = ResponseExpectation {
            contains: vec!["false".to_string()],
            contains_ignore_case: vec!["error".to_string()],
            ..ResponseExpectation::default()
        };
        assert_eq!(compare(&expect, r#"{"result":{"success":FALSE}}"#), Status::Fail);
        assert_eq!(compare(&expect, r#"{"Error":{"code":2}}"#), Status::Pass);
    }

    #[test]
    fn test_contains_is_case_sensitive_by_default() {
        let expect = ResponseExpectation {
            contains: vec!["error".to_string()],
            ..ResponseExpectation::default()
        };
        assert_eq!(compare(&expect, "ERROR"), Status::Fail);
        assert_eq!(compare(&expect, "an error"), Status::Pass);
    }

    #[test]
    fn test_sentinel_fails_exact_expectation() {
        let expect = ResponseExpectation::exact(UNKNOWN_METHOD);
        let observed = Observed::NoResponse {
            reason: "command printed nothing".to_string(),
        };
        assert_eq!(compare(&expect, observed.as_str()), Status::Fail);
    }

    #[tokio::test]
    async fn test_pass_captures_no_logs() {
        let (logs, calls) = collector(ProbeOutcome::Found(vec!["ERROR boom".to_string()]));
        let outcome = evaluate(
            "TCID008",
            &ResponseExpectation::exact(UNKNOWN_METHOD),
            &Observed::Response(UNKNOWN_METHOD.to_string()),
            &OutcomeMessages::default(),
            &logs,
        )
        .await;

        assert_eq!(outcome.status, Status::Pass);
        assert_eq!(outcome.message, "Output response is matching with expected one");
        assert!(outcome.report_logs.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fail_attaches_logs() {
        let (logs, calls) = collector(ProbeOutcome::Found(vec!["ERROR boom".to_string()]));
        let outcome = evaluate(
            "TCID009",
            &ResponseExpectation::exact(UNKNOWN_METHOD),
            &Observed::Response(r#"{"jsonrpc":"2.0","id":42,"result":null}"#.to_string()),
            &OutcomeMessages::default(),
            &logs,
        )
        .await;

        assert_eq!(outcome.status, Status::Fail);
        assert!(outcome.message.starts_with("Output response is different from expected one"));
        assert!(outcome.message.ends_with(LOGS_CAPTURED_NOTE));
        let report_logs = outcome.report_logs.unwrap();
        assert!(report_logs.contains("WPEFramework Logs for Test Case: TCID009"));
        assert!(report_logs.contains("ERROR boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fail_without_logs_keeps_message() {
        let (logs, _) = collector(ProbeOutcome::Unavailable("nothing".to_string()));
        let outcome = evaluate(
            "TCID010",
            &ResponseExpectation::exact(UNKNOWN_METHOD),
            &Observed::NoResponse {
                reason: "command printed nothing".to_string(),
            },
            &OutcomeMessages::default(),
            &logs,
        )
        .await;

        assert_eq!(outcome.status, Status::Fail);
        assert_eq!(outcome.message, "Output response is different from expected one");
        assert_eq!(outcome.report_logs.as_deref(), Some(NO_LOGS_FOUND));
    }

    #[tokio::test]
    async fn test_probe_panic_becomes_inline_text() {
        let scraper = LogScraper::new(vec![Box::new(PanickingProbe)]);
        let logs = LogCollector::new(scraper, &LogsConfig::default());
        let excerpt = logs.excerpt("TCID011", 10).await;
        assert!(excerpt.starts_with("Error capturing WPEFramework logs:"));
    }
}
