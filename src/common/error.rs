//! Error types for the conformance runner
//!
//! Only setup-level problems surface as errors. Anything on the per-test
//! path (a dead RPC endpoint, missing logs, a mock push that fails) degrades
//! to a sentinel value or inline text instead.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the conformance runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Scenario Errors ===
    #[error("Failed to parse scenario '{path}': {error}")]
    ScenarioParse { path: String, error: String },

    #[error("Scenario '{0}' has no steps")]
    EmptyScenario(String),

    // === Report Errors ===
    #[error("Report row rejected: {0}")]
    InvalidRow(String),

    #[error("Test case '{0}' was already recorded in this run")]
    DuplicateTestId(String),

    #[error("Failed to write report '{path}': {error}")]
    ReportWrite { path: String, error: String },

    #[error("{failed} of {total} test case(s) failed")]
    TestsFailed { failed: usize, total: usize },

    // === Mock Backend Errors ===
    #[error("Mock backend request to '{url}' failed: {error}")]
    MockRequest { url: String, error: String },

    #[error("Invalid mock backend address '{0}'")]
    MockAddress(String),

    // === Service Errors ===
    #[error("Failed to start '{name}': {error}")]
    ServiceSpawn { name: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a report write error
    pub fn report_write(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::ReportWrite {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a mock request error
    pub fn mock_request(url: &str, error: impl std::fmt::Display) -> Self {
        Self::MockRequest {
            url: url.to_string(),
            error: error.to_string(),
        }
    }

    /// Create a service spawn error
    pub fn service_spawn(name: &str, error: impl std::fmt::Display) -> Self {
        Self::ServiceSpawn {
            name: name.to_string(),
            error: error.to_string(),
        }
    }
}
