//! Command runner
//!
//! Runs an HTTP request command line (normally `curl`) and pulls the JSON-RPC
//! response out of whatever it printed. Nothing here fails: a command that
//! cannot run, hangs past its timeout or prints no JSON yields
//! [`Observed::NoResponse`], which callers compare like any other response.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::common::config::RpcConfig;

/// Text recorded when no JSON response could be captured
pub const NO_RESPONSE: &str = "< No response from WPEFramework >";

/// A JSON line shorter than this counts as no response
///
/// Measured in bytes on the line with its terminator already stripped, so a
/// four-character line such as `1234` is rejected even when it arrived as
/// `1234\n`. Every JSON-RPC reply is far longer; only bare scalars are
/// affected.
const MIN_RESPONSE_LEN: usize = 5;

/// What a command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    /// First stdout line that parsed as JSON, verbatim
    Response(String),
    /// Nothing usable was captured
    NoResponse { reason: String },
}

impl Observed {
    /// The text compared against expectations and written to the report
    pub fn as_str(&self) -> &str {
        match self {
            Observed::Response(line) => line,
            Observed::NoResponse { .. } => NO_RESPONSE,
        }
    }

    /// Whether a JSON line was captured
    pub fn is_response(&self) -> bool {
        matches!(self, Observed::Response(_))
    }

    fn none(reason: impl Into<String>) -> Self {
        Observed::NoResponse {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select the response from raw command output
///
/// Returns the first line that parses as JSON, without its line terminator.
pub fn extract_response(output: &str) -> Observed {
    let found = output
        .lines()
        .find(|line| serde_json::from_str::<serde_json::Value>(line).is_ok());

    match found {
        Some(line) if line.len() >= MIN_RESPONSE_LEN => Observed::Response(line.to_string()),
        Some(line) => Observed::none(format!("response too short: {line:?}")),
        None if output.trim().is_empty() => Observed::none("command printed nothing"),
        None => Observed::none("no line of output was valid JSON"),
    }
}

/// Runs request commands through the shell
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// Create a runner; `None` waits for the command indefinitely
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Create a runner from the `[rpc]` configuration section
    pub fn from_config(config: &RpcConfig) -> Self {
        Self::new(config.command_timeout_secs.map(Duration::from_secs))
    }

    /// Run `command` with `sh -c` and return the captured response
    pub async fn send(&self, command: &str) -> Observed {
        tracing::debug!(command, "Sending command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, cmd.output()).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(command, ?limit, "Command timed out");
                    return Observed::none(format!("timed out after {limit:?}"));
                }
            },
            None => cmd.output().await,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(command, error = %e, "Command failed to execute");
                return Observed::none(format!("failed to execute: {e}"));
            }
        };

        if !output.stderr.is_empty() {
            tracing::trace!(stderr = %String::from_utf8_lossy(&output.stderr), "Command stderr");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let observed = extract_response(&stdout);
        if let Observed::NoResponse { reason } = &observed {
            tracing::debug!(command, reason = %reason, status = ?output.status.code(), "No response captured");
        }
        observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_json_line_is_returned_verbatim() {
        let output = "  % Total    % Received\nnot json\n{\"jsonrpc\":\"2.0\",\"id\":42,\"result\":{\"success\":true}}\n{\"second\":1}\n";
        let observed = extract_response(output);
        assert_eq!(
            observed,
            Observed::Response(r#"{"jsonrpc":"2.0","id":42,"result":{"success":true}}"#.to_string())
        );
    }

    #[test]
    fn test_spacing_is_not_reserialized() {
        let line = r#"{ "jsonrpc" : "2.0", "id":42,"result":null }"#;
        assert_eq!(extract_response(line).as_str(), line);
    }

    #[test]
    fn test_no_json_yields_sentinel() {
        let observed = extract_response("curl: (7) Failed to connect\n");
        assert!(!observed.is_response());
        assert_eq!(observed.as_str(), NO_RESPONSE);
    }

    #[test]
    fn test_empty_output_yields_sentinel() {
        assert_eq!(extract_response("").as_str(), NO_RESPONSE);
    }

    #[test]
    fn test_short_json_yields_sentinel() {
        let observed = extract_response("42\n");
        assert_eq!(observed.as_str(), NO_RESPONSE);
        match observed {
            Observed::NoResponse { reason } => assert!(reason.contains("too short")),
            _ => panic!("Expected NoResponse"),
        }
    }

    #[test]
    fn test_length_boundary_ignores_line_terminator() {
        assert_eq!(extract_response("1234\n").as_str(), NO_RESPONSE);
        assert_eq!(extract_response("1234\r\n").as_str(), NO_RESPONSE);
        assert_eq!(extract_response("12345\n").as_str(), "12345");
    }

    #[tokio::test]
    async fn test_send_captures_shell_output() {
        let runner = CommandRunner::default();
        let observed = runner
            .send(r#"echo 'noise'; echo '{"jsonrpc":"2.0","id":42,"result":{"success":true}}'"#)
            .await;
        assert_eq!(
            observed.as_str(),
            r#"{"jsonrpc":"2.0","id":42,"result":{"success":true}}"#
        );
    }

    #[tokio::test]
    async fn test_failing_command_degrades_to_sentinel() {
        let runner = CommandRunner::default();
        let observed = runner.send("exit 3").await;
        assert_eq!(observed.as_str(), NO_RESPONSE);
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_sentinel() {
        let runner = CommandRunner::new(Some(Duration::from_millis(100)));
        let observed = runner.send("sleep 5; echo '{\"late\":true}'").await;
        match observed {
            Observed::NoResponse { reason } => assert!(reason.contains("timed out")),
            _ => panic!("Expected NoResponse"),
        }
    }
}
