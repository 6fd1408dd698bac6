//! Scenario test runner
//!
//! Reads YAML test scenarios, drives them against the framework and the
//! mock backend, and records each verdict through the reporter.

mod config;
mod outcome;
mod runner;

pub use config::*;
pub use outcome::{compare, evaluate, LogCollector, Outcome, LOGS_CAPTURED_NOTE};
pub use runner::{Harness, TestResult};
