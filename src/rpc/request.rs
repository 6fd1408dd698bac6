//! JSON-RPC request construction
//!
//! Builds the request body and the curl command line that posts it, so
//! scenarios can name a method and params instead of spelling out curl.

use serde::Serialize;
use serde_json::Value;

use crate::common::config::RpcConfig;
use crate::common::Result;

/// A JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a Value>,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Option<&'a Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }

    /// Serialize to the compact body sent on the wire
    pub fn to_body(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Quote a string for POSIX `sh`
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Build the curl command that posts `method` to the configured endpoint
pub fn curl_command(config: &RpcConfig, method: &str, params: Option<&Value>) -> Result<String> {
    let body = RpcRequest::new(config.request_id, method, params).to_body()?;
    Ok(format!(
        "curl --silent --header \"Content-Type: application/json\" --request POST --data {} {}",
        shell_quote(&body),
        shell_quote(&config.endpoint)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_field_order() {
        let params = json!({"enabled": false});
        let body = RpcRequest::new(42, "org.rdk.HdmiCecSource.setEnabled", Some(&params))
            .to_body()
            .unwrap();
        assert_eq!(
            body,
            r#"{"jsonrpc":"2.0","id":42,"method":"org.rdk.HdmiCecSource.setEnabled","params":{"enabled":false}}"#
        );
    }

    #[test]
    fn test_body_without_params() {
        let body = RpcRequest::new(7, "org.rdk.HdmiCecSink.getActiveSource", None)
            .to_body()
            .unwrap();
        assert_eq!(
            body,
            r#"{"jsonrpc":"2.0","id":7,"method":"org.rdk.HdmiCecSink.getActiveSource"}"#
        );
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r#"'it'\''s'"#);
        assert_eq!(shell_quote("plain"), "'plain'");
    }

    #[test]
    fn test_curl_command() {
        let config = RpcConfig::default();
        let cmd = curl_command(&config, "org.rdk.HdmiCecSink.getEnabled", None).unwrap();
        assert!(cmd.starts_with("curl --silent"));
        assert!(cmd.contains(r#"--data '{"jsonrpc":"2.0","id":42,"method":"org.rdk.HdmiCecSink.getEnabled"}'"#));
        assert!(cmd.ends_with("'http://127.0.0.1:55555/jsonrpc'"));
    }
}
