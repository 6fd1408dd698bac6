//! HTTP client for the mock backend control channel
//!
//! The backend takes its payloads as a URL-encoded JSON path segment on a
//! plain GET, e.g. `GET /Database.setDeviceConfig/%7B%22...%7D`.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use crate::common::config::MockConfig;
use crate::common::{Error, Result};

/// Control APIs exposed by the mock backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockApi {
    /// Replace the emulated CEC network topology
    SetDeviceConfig,
    /// Override HAL API return values
    SetApiConfig,
    /// Inject a CEC message as if sent by another device
    SendMessage,
}

impl MockApi {
    /// Path segment naming the API
    pub fn path(self) -> &'static str {
        match self {
            MockApi::SetDeviceConfig => "Database.setDeviceConfig",
            MockApi::SetApiConfig => "Hdmicec.setAPIConfig",
            MockApi::SendMessage => "Hdmicec.sendMessage",
        }
    }
}

impl fmt::Display for MockApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The backend's answer to one push
#[derive(Debug, Clone)]
pub struct MockReply {
    pub api: MockApi,
    pub status: StatusCode,
    pub body: String,
}

impl MockReply {
    /// Whether the backend accepted the push
    ///
    /// Configuration calls answer with a body containing `Success`; message
    /// injection only signals through the status code.
    pub fn accepted(&self) -> bool {
        match self.api {
            MockApi::SetDeviceConfig | MockApi::SetApiConfig => self.body.contains("Success"),
            MockApi::SendMessage => self.status == StatusCode::OK,
        }
    }
}

/// Client for the mock backend
#[derive(Debug, Clone)]
pub struct MockClient {
    server: String,
    http: Client,
}

impl MockClient {
    /// Create a client for `host:port`
    pub fn new(server: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            server: server.into(),
            http,
        })
    }

    /// Create a client from the `[mock]` configuration section
    pub fn from_config(config: &MockConfig) -> Result<Self> {
        Self::new(&config.server, Duration::from_secs(config.timeout_secs))
    }

    /// Build the request URL for a push
    pub fn url(&self, api: MockApi, payload: &Value) -> Result<Url> {
        let mut url = Url::parse(&format!("http://{}/", self.server))
            .map_err(|_| Error::MockAddress(self.server.clone()))?;
        let encoded = serde_json::to_string(payload)?;
        url.path_segments_mut()
            .map_err(|_| Error::MockAddress(self.server.clone()))?
            .pop_if_empty()
            .push(api.path())
            .push(&encoded);
        Ok(url)
    }

    /// Send one payload to the backend
    pub async fn push(&self, api: MockApi, payload: &Value) -> Result<MockReply> {
        let url = self.url(api, payload)?;
        tracing::debug!(%url, "Pushing mock configuration");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::mock_request(url.as_str(), e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::mock_request(url.as_str(), e))?;

        tracing::debug!(api = %api, %status, body = %body, "Mock backend replied");
        Ok(MockReply { api, status, body })
    }

    /// Replace the emulated device topology
    pub async fn set_device_config(&self, payload: &Value) -> Result<MockReply> {
        self.push(MockApi::SetDeviceConfig, payload).await
    }

    /// Override HAL API behaviour
    pub async fn set_api_config(&self, payload: &Value) -> Result<MockReply> {
        self.push(MockApi::SetApiConfig, payload).await
    }

    /// Inject a CEC message
    pub async fn send_message(&self, payload: &Value) -> Result<MockReply> {
        self.push(MockApi::SendMessage, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MockClient {
        MockClient::new("127.0.0.1:5000", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_url_encodes_payload_as_one_segment() {
        let url = client()
            .url(
                MockApi::SetDeviceConfig,
                &json!({"devices": [{"name": "TV / Panel", "logicalAddress": 0}]}),
            )
            .unwrap();

        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.port(), Some(5000));
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());

        let segments: Vec<_> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], "Database.setDeviceConfig");
        assert!(!segments[1].contains('{'));
        assert!(!segments[1].contains('"'));
        assert!(!segments[1].contains('/'));
    }

    #[test]
    fn test_api_paths() {
        assert_eq!(MockApi::SetApiConfig.path(), "Hdmicec.setAPIConfig");
        assert_eq!(MockApi::SendMessage.to_string(), "Hdmicec.sendMessage");
    }

    #[test]
    fn test_bad_server_address() {
        let client = MockClient::new("not a host:port", Duration::from_secs(1)).unwrap();
        let err = client.url(MockApi::SendMessage, &json!({})).unwrap_err();
        assert!(matches!(err, Error::MockAddress(_)));
    }

    #[test]
    fn test_acceptance_rules() {
        let reply = |api, status, body: &str| MockReply {
            api,
            status,
            body: body.to_string(),
        };

        assert!(reply(MockApi::SetDeviceConfig, StatusCode::OK, "{\"status\":\"Success\"}").accepted());
        assert!(!reply(MockApi::SetApiConfig, StatusCode::OK, "Failure").accepted());
        assert!(reply(MockApi::SendMessage, StatusCode::OK, "").accepted());
        assert!(!reply(MockApi::SendMessage, StatusCode::INTERNAL_SERVER_ERROR, "Success").accepted());
    }
}
