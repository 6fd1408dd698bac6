//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{config_path, home_dir};
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// JSON-RPC endpoint settings
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Mock backend settings
    #[serde(default)]
    pub mock: MockConfig,

    /// Services restarted between scenarios
    #[serde(default)]
    pub services: ServicesConfig,

    /// Where to look for framework logs on failure
    #[serde(default)]
    pub logs: LogsConfig,

    /// CSV report settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Run log settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// JSON-RPC endpoint settings
#[derive(Debug, Deserialize, Clone)]
pub struct RpcConfig {
    /// URL the curl commands post to
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request id placed in every JSON-RPC request
    #[serde(default = "default_request_id")]
    pub request_id: u64,

    /// Give up on a command after this many seconds (unset: wait forever)
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_id: default_request_id(),
            command_timeout_secs: None,
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:55555/jsonrpc".to_string()
}
fn default_request_id() -> u64 {
    42
}

/// Mock backend settings
#[derive(Debug, Deserialize, Clone)]
pub struct MockConfig {
    /// host:port of the mock backend
    #[serde(default = "default_mock_server")]
    pub server: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_mock_timeout")]
    pub timeout_secs: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            server: default_mock_server(),
            timeout_secs: default_mock_timeout(),
        }
    }
}

fn default_mock_server() -> String {
    "127.0.0.1:5000".to_string()
}
fn default_mock_timeout() -> u64 {
    10
}

/// How the lifecycle helper decides a restarted service is up
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Readiness {
    /// Poll the service port with backoff until it accepts connections
    #[default]
    Poll,
    /// Sleep a fixed 5 seconds and hope for the best
    FixedDelay,
}

/// Services restarted between scenarios
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    /// Process name of the framework under test
    #[serde(default = "default_framework_process")]
    pub framework_process: String,

    /// Port the framework serves JSON-RPC on
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Port the websocket server listens on
    #[serde(default = "default_websocket_port")]
    pub websocket_port: u16,

    /// Directory holding the websocket server script
    #[serde(default = "default_dir")]
    pub websocket_dir: PathBuf,

    /// Websocket server script, run with python3
    #[serde(default = "default_websocket_script")]
    pub websocket_script: String,

    /// Directory holding the framework restart script
    #[serde(default = "default_dir")]
    pub restart_dir: PathBuf,

    /// Framework restart script
    #[serde(default = "default_restart_script")]
    pub restart_script: String,

    /// Readiness strategy after spawning
    #[serde(default)]
    pub readiness: Readiness,

    /// Upper bound on readiness polling, per service
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            framework_process: default_framework_process(),
            rpc_port: default_rpc_port(),
            websocket_port: default_websocket_port(),
            websocket_dir: default_dir(),
            websocket_script: default_websocket_script(),
            restart_dir: default_dir(),
            restart_script: default_restart_script(),
            readiness: Readiness::default(),
            ready_timeout_secs: default_ready_timeout(),
        }
    }
}

fn default_framework_process() -> String {
    "WPEFramework".to_string()
}
fn default_rpc_port() -> u16 {
    55555
}
fn default_websocket_port() -> u16 {
    9000
}
fn default_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_websocket_script() -> String {
    "websocket_server.py".to_string()
}
fn default_restart_script() -> String {
    "restart.sh".to_string()
}
fn default_ready_timeout() -> u64 {
    30
}

/// Log capture settings
#[derive(Debug, Deserialize, Clone)]
pub struct LogsConfig {
    /// Framework log file checked first
    #[serde(default)]
    pub primary_path: Option<PathBuf>,

    /// systemd unit queried through journalctl
    #[serde(default = "default_journal_unit")]
    pub journal_unit: String,

    /// Files tried in order when nothing else is configured
    #[serde(default = "default_fallback_paths")]
    pub fallback_paths: Vec<PathBuf>,

    /// Token marking a line as relevant to the component under test
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Lines scraped for the console on failure
    #[serde(default = "default_display_lines")]
    pub display_lines: usize,

    /// Lines scraped for the report row on failure
    #[serde(default = "default_report_lines")]
    pub report_lines: usize,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            primary_path: None,
            journal_unit: default_journal_unit(),
            fallback_paths: default_fallback_paths(),
            marker: default_marker(),
            display_lines: default_display_lines(),
            report_lines: default_report_lines(),
        }
    }
}

fn default_journal_unit() -> String {
    "WPEFramework".to_string()
}
fn default_fallback_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/var/log/WPEFramework.log"),
        PathBuf::from("/tmp/WPEFramework.log"),
    ];
    if let Some(home) = home_dir() {
        paths.push(home.join("WPEFramework.log"));
    }
    paths.push(PathBuf::from("log_file.txt"));
    paths
}
fn default_marker() -> String {
    "HdmiCec".to_string()
}
fn default_display_lines() -> usize {
    100
}
fn default_report_lines() -> usize {
    50
}

/// CSV report settings
#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Report file rows are appended to
    #[serde(default = "default_report_path")]
    pub path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
        }
    }
}

fn default_report_path() -> PathBuf {
    PathBuf::from("test_report.csv")
}

/// Run log settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    /// Directory for the per-run trace log (unset: console only)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path, or the default config file
    ///
    /// Returns default configuration if no file exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => config_path().filter(|p| p.exists()),
        };

        match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| super::Error::file_read(&path, e))?;
                Self::from_toml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
