//! Test result reporting
//!
//! One [`Reporter`] lives for the whole run. It appends a CSV row per test
//! and keeps the ordered Passed/Failed id lists for the end-of-run summary.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Column headers of the report file
pub const HEADER: [&str; 5] = ["Test Case ID", "Output Response", "Status", "Message", "Logs"];

/// Verdict of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "Pass",
            Status::Fail => "Fail",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the report
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub test_id: String,
    pub response: String,
    pub status: Status,
    pub message: String,
    /// Classified framework logs, attached to failures
    pub logs: Option<String>,
}

/// Totals for the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub passed: Vec<String>,
    pub failed: Vec<String>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Accumulates results and appends them to the CSV report
#[derive(Debug)]
pub struct Reporter {
    path: PathBuf,
    passed: Vec<String>,
    failed: Vec<String>,
}

impl Reporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            passed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Path rows are appended to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a row and file the id under Passed or Failed
    ///
    /// The row is flushed before this returns. An empty id, or one already
    /// recorded in this run, is rejected without touching the file.
    pub fn record(&mut self, row: &ReportRow) -> Result<()> {
        if row.test_id.trim().is_empty() {
            return Err(Error::InvalidRow("test id is empty".to_string()));
        }
        if self.is_recorded(&row.test_id) {
            return Err(Error::DuplicateTestId(row.test_id.clone()));
        }

        self.append(row)
            .map_err(|e| Error::report_write(&self.path, e))?;

        match row.status {
            Status::Pass => self.passed.push(row.test_id.clone()),
            Status::Fail => self.failed.push(row.test_id.clone()),
        }
        Ok(())
    }

    fn append(&self, row: &ReportRow) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut out = String::new();
        if file.metadata()?.len() == 0 {
            out.push_str(&csv_line(&HEADER));
        }
        out.push_str(&csv_line(&[
            row.test_id.as_str(),
            row.response.as_str(),
            row.status.as_str(),
            row.message.as_str(),
            row.logs.as_deref().unwrap_or(""),
        ]));

        file.write_all(out.as_bytes())?;
        file.flush()?;
        file.sync_data()
    }

    /// Whether `test_id` already has a row in this run
    pub fn is_recorded(&self, test_id: &str) -> bool {
        self.passed.iter().chain(&self.failed).any(|id| id == test_id)
    }

    /// Ids that passed, in execution order
    pub fn passed(&self) -> &[String] {
        &self.passed
    }

    /// Ids that failed, in execution order
    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn summary(&self) -> Summary {
        Summary {
            passed: self.passed.clone(),
            failed: self.failed.clone(),
        }
    }
}

/// Quote a field when it holds a delimiter, quote or line break
fn csv_field(field: &str) -> String {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One CSV record, CRLF-terminated
fn csv_line(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn row(id: &str, status: Status) -> ReportRow {
        ReportRow {
            test_id: id.to_string(),
            response: r#"{"jsonrpc":"2.0","id":42,"result":{"success":true}}"#.to_string(),
            status,
            message: "Output response is matching with expected one".to_string(),
            logs: None,
        }
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field(r#"{"k":1}"#), r#""{""k"":1}""#);
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut reporter = Reporter::new(&path);

        reporter.record(&row("TCID001", Status::Pass)).unwrap();
        reporter.record(&row("TCID002", Status::Fail)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("Test Case ID").count(), 1);
        assert!(content.starts_with("Test Case ID,Output Response,Status,Message,Logs\r\n"));
        assert!(content.contains("TCID001,"));
        assert!(content.contains(",Fail,"));
    }

    #[test]
    fn test_existing_report_is_appended() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");

        Reporter::new(&path).record(&row("TCID001", Status::Pass)).unwrap();
        Reporter::new(&path).record(&row("TCID002", Status::Pass)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("Test Case ID").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_partition_and_order() {
        let dir = tempdir().unwrap();
        let mut reporter = Reporter::new(dir.path().join("report.csv"));
        let statuses = [Status::Pass, Status::Fail, Status::Pass, Status::Fail, Status::Fail];

        for (i, status) in statuses.iter().enumerate() {
            reporter.record(&row(&format!("TC{i}"), *status)).unwrap();
        }

        assert_eq!(reporter.passed(), &["TC0", "TC2"]);
        assert_eq!(reporter.failed(), &["TC1", "TC3", "TC4"]);
        let summary = reporter.summary();
        assert_eq!(summary.total(), statuses.len());
        assert!(!summary.all_passed());
        assert!(summary.passed.iter().all(|id| !summary.failed.contains(id)));
    }

    #[test]
    fn test_empty_id_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut reporter = Reporter::new(&path);

        let err = reporter.record(&row("  ", Status::Pass)).unwrap_err();
        assert!(matches!(err, Error::InvalidRow(_)));
        assert!(!path.exists());
        assert_eq!(reporter.summary().total(), 0);
    }

    #[test]
    fn test_is_recorded_covers_both_lists() {
        let dir = tempdir().unwrap();
        let mut reporter = Reporter::new(dir.path().join("report.csv"));
        assert!(!reporter.is_recorded("TCID001"));

        reporter.record(&row("TCID001", Status::Pass)).unwrap();
        reporter.record(&row("TCID002", Status::Fail)).unwrap();
        assert!(reporter.is_recorded("TCID001"));
        assert!(reporter.is_recorded("TCID002"));
        assert!(!reporter.is_recorded("TCID003"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let dir = tempdir().unwrap();
        let mut reporter = Reporter::new(dir.path().join("report.csv"));

        reporter.record(&row("TCID001", Status::Pass)).unwrap();
        let err = reporter.record(&row("TCID001", Status::Fail)).unwrap_err();
        assert!(matches!(err, Error::DuplicateTestId(_)));
        assert_eq!(reporter.passed(), &["TCID001"]);
        assert!(reporter.failed().is_empty());
    }

    #[test]
    fn test_logs_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("report.csv");
        let mut reporter = Reporter::new(&path);

        let mut failed = row("TCID003", Status::Fail);
        failed.logs = Some("ERROR Logs:\nboom".to_string());
        reporter.record(&failed).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"ERROR Logs:\nboom\"\r\n"));
    }
}
