//! HDMI-CEC conformance runner
//!
//! This library drives WPEFramework's HdmiCec plugins through JSON-RPC,
//! configures a mock CEC backend over HTTP, scrapes the framework logs when
//! a test fails, and writes one CSV report row per test case.

pub mod cli;
pub mod commands;
pub mod common;
pub mod logs;
pub mod mock;
pub mod report;
pub mod rpc;
pub mod service;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use report::{ReportRow, Reporter, Status};
pub use rpc::Observed;
