//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::common::{Error, Result};

/// A complete test case loaded from a YAML file
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct TestScenario {
    /// Test case id, the first column of the report
    pub id: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// Restart the framework and websocket server before the test
    #[serde(default)]
    pub restart: bool,
    /// Mock backend state to push before the steps
    pub setup: Option<MockSetup>,
    /// RPC calls to make; the response of the last one is checked
    pub steps: Vec<RpcStep>,
    /// What the last response must look like
    pub expect: ResponseExpectation,
    /// Report messages for each verdict
    #[serde(default)]
    pub messages: OutcomeMessages,
    /// Post-conditions, applied even when the row could not be recorded
    pub teardown: Option<MockSetup>,
}

/// Pre- or post-conditions of a test
///
/// Mock pushes go first, then injected messages, then RPC steps whose
/// responses are logged but never checked.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct MockSetup {
    /// Emulated CEC network (`Database.setDeviceConfig`)
    pub device_config: Option<Value>,
    /// HAL API overrides (`Hdmicec.setAPIConfig`)
    pub api_config: Option<Value>,
    /// CEC messages injected in order (`Hdmicec.sendMessage`)
    #[serde(default)]
    pub messages: Vec<Value>,
    /// Pause after each injected message, in milliseconds
    #[serde(default)]
    pub settle_ms: u64,
    /// RPC calls made after the pushes, e.g. re-enabling CEC
    #[serde(default)]
    pub steps: Vec<RpcStep>,
}

impl MockSetup {
    pub fn is_empty(&self) -> bool {
        self.device_config.is_none()
            && self.api_config.is_none()
            && self.messages.is_empty()
            && self.steps.is_empty()
    }
}

/// One RPC call
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RpcStep {
    /// JSON-RPC method call, sent with curl to the configured endpoint
    Method {
        method: String,
        #[serde(default)]
        params: Option<Value>,
    },
    /// A complete command line, run as-is
    Command { command: String },
}

impl RpcStep {
    /// Short label for console output
    pub fn label(&self) -> &str {
        match self {
            RpcStep::Method { method, .. } => method,
            RpcStep::Command { command } => command,
        }
    }
}

/// Expectation on the observed response
///
/// The test passes when `equals` matches exactly or any substring
/// alternative appears in the response. Matching is on raw text, so a
/// response with the same fields in a different order does not equal the
/// expected literal.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ResponseExpectation {
    /// Exact expected response
    pub equals: Option<String>,
    /// Accepted substrings, matched as written
    #[serde(default)]
    pub contains: Vec<String>,
    /// Accepted substrings, matched on the lower-cased response
    #[serde(default)]
    pub contains_ignore_case: Vec<String>,
}

impl ResponseExpectation {
    /// Expect exactly `response`
    pub fn exact(response: impl Into<String>) -> Self {
        Self {
            equals: Some(response.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_none() && self.contains.is_empty() && self.contains_ignore_case.is_empty()
    }
}

/// Report messages for each verdict
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct OutcomeMessages {
    #[serde(default = "default_pass_message")]
    pub pass: String,
    #[serde(default = "default_fail_message")]
    pub fail: String,
}

impl Default for OutcomeMessages {
    fn default() -> Self {
        Self {
            pass: default_pass_message(),
            fail: default_fail_message(),
        }
    }
}

fn default_pass_message() -> String {
    "Output response is matching with expected one".to_string()
}

fn default_fail_message() -> String {
    "Output response is different from expected one".to_string()
}

impl TestScenario {
    /// Parse and validate a scenario from YAML text
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self> {
        let scenario: TestScenario =
            serde_yaml::from_str(content).map_err(|e| Error::ScenarioParse {
                path: origin.to_string(),
                error: e.to_string(),
            })?;

        if scenario.id.trim().is_empty() {
            return Err(Error::ScenarioParse {
                path: origin.to_string(),
                error: "id must not be empty".to_string(),
            });
        }
        if scenario.steps.is_empty() {
            return Err(Error::EmptyScenario(scenario.id));
        }
        if scenario.expect.is_empty() {
            return Err(Error::ScenarioParse {
                path: origin.to_string(),
                error: "expect needs 'equals', 'contains' or 'contains_ignore_case'".to_string(),
            });
        }
        Ok(scenario)
    }

    /// Load a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_yaml(&content, &path.display().to_string())
    }
}
