//! Test runner implementation
//!
//! Executes scenarios one at a time: optional restart, mock setup, RPC
//! steps, verdict, report row, teardown. Problems on the per-test path are
//! printed and the scenario carries on to a verdict; only an unreadable
//! scenario or an unwritable report stops it.

use std::time::Duration;

use colored::Colorize;

use crate::common::config::Config;
use crate::common::{logging, rule, Result};
use crate::mock::{MockClient, MockReply};
use crate::report::{ReportRow, Reporter, Status};
use crate::rpc::{curl_command, CommandRunner, Observed};
use crate::service::{ServiceLifecycle, StartCondition};

use super::config::{MockSetup, RpcStep, TestScenario};
use super::outcome::{evaluate, LogCollector};

/// Result of one scenario
#[derive(Debug)]
pub struct TestResult {
    pub id: String,
    pub status: Status,
    pub response: String,
    pub steps_run: usize,
}

/// Everything a scenario needs to talk to the outside world
pub struct Harness {
    config: Config,
    runner: CommandRunner,
    mock: MockClient,
    logs: LogCollector,
    lifecycle: ServiceLifecycle,
    verbose: bool,
}

impl Harness {
    pub fn new(
        config: Config,
        runner: CommandRunner,
        mock: MockClient,
        logs: LogCollector,
        verbose: bool,
    ) -> Self {
        let lifecycle = ServiceLifecycle::new(config.services.clone());
        Self {
            config,
            runner,
            mock,
            logs,
            lifecycle,
            verbose,
        }
    }

    pub fn from_config(config: Config, verbose: bool) -> Result<Self> {
        let runner = CommandRunner::from_config(&config.rpc);
        let mock = MockClient::from_config(&config.mock)?;
        let logs = LogCollector::from_config(&config);
        Ok(Self::new(config, runner, mock, logs, verbose))
    }

    /// Run a parsed scenario and record its row
    pub async fn run(&self, scenario: &TestScenario, reporter: &mut Reporter) -> Result<TestResult> {
        if let Some(desc) = &scenario.description {
            println!("TC Description - {}", desc);
        }
        println!("{}", rule('-'));

        if scenario.restart {
            self.restart_services().await;
        }

        if let Some(setup) = &scenario.setup {
            self.apply_mock(setup, "initial").await;
        }

        let mut observed = Observed::NoResponse {
            reason: "no step was run".to_string(),
        };
        for step in &scenario.steps {
            observed = self.run_step(step).await;
        }
        println!("{}", rule('-'));

        let outcome = evaluate(
            &scenario.id,
            &scenario.expect,
            &observed,
            &scenario.messages,
            &self.logs,
        )
        .await;

        print_result(&scenario.id, observed.as_str(), outcome.status, &outcome.message);

        let recorded = reporter.record(&ReportRow {
            test_id: scenario.id.clone(),
            response: observed.as_str().to_string(),
            status: outcome.status,
            message: outcome.message,
            logs: outcome.report_logs,
        });

        // Post-conditions hold for the next scenario whether or not the row landed
        if let Some(teardown) = &scenario.teardown {
            self.apply_mock(teardown, "restore").await;
        }
        recorded?;

        Ok(TestResult {
            id: scenario.id.clone(),
            status: outcome.status,
            response: observed.as_str().to_string(),
            steps_run: scenario.steps.len(),
        })
    }

    /// Send one RPC step and report whether anything came back
    pub async fn run_step(&self, step: &RpcStep) -> Observed {
        let command = match step {
            RpcStep::Method { method, params } => {
                match curl_command(&self.config.rpc, method, params.as_ref()) {
                    Ok(command) => command,
                    Err(e) => {
                        logging::error(&format!("could not build request for {}: {}", method, e));
                        return Observed::NoResponse {
                            reason: e.to_string(),
                        };
                    }
                }
            }
            RpcStep::Command { command } => command.clone(),
        };

        if self.verbose {
            println!("  $ {}", command.dimmed());
        }

        let observed = self.runner.send(&command).await;
        match &observed {
            Observed::Response(_) => {
                logging::info(&format!("curl command sent for {}", step.label()));
            }
            Observed::NoResponse { reason } => {
                logging::error(&format!("curl command failed for {} ({})", step.label(), reason));
            }
        }
        observed
    }

    /// Apply pre- or post-conditions; failures are printed and otherwise ignored
    ///
    /// Returns true when every push was accepted and every step answered.
    pub async fn apply_mock(&self, setup: &MockSetup, stage: &str) -> bool {
        if setup.is_empty() {
            return true;
        }

        let mut configured = true;
        if let Some(device) = &setup.device_config {
            configured &= self.report_push(self.mock.set_device_config(device).await);
        }
        if let Some(api) = &setup.api_config {
            configured &= self.report_push(self.mock.set_api_config(api).await);
        }
        if setup.device_config.is_some() || setup.api_config.is_some() {
            if configured {
                logging::info(&format!("Pushed {} configuration to the mock backend", stage));
            } else {
                logging::error(&format!(
                    "Failed to push {} configuration to the mock backend",
                    stage
                ));
            }
        }

        let mut delivered = true;
        for message in &setup.messages {
            let ok = self.report_push(self.mock.send_message(message).await);
            if ok {
                logging::info(&format!("sendMessage emulation success for {}", message));
            } else {
                logging::error(&format!("sendMessage emulation failed for {}", message));
            }
            delivered &= ok;
            if setup.settle_ms > 0 {
                tokio::time::sleep(Duration::from_millis(setup.settle_ms)).await;
            }
        }

        let mut answered = true;
        for step in &setup.steps {
            answered &= self.run_step(step).await.is_response();
        }
        if !setup.steps.is_empty() && answered {
            logging::info(&format!("Applied {} RPC steps", stage));
        }

        configured && delivered && answered
    }

    fn report_push(&self, reply: Result<MockReply>) -> bool {
        match reply {
            Ok(reply) => {
                if self.verbose {
                    println!("  {} -> {} {}", reply.api, reply.status, reply.body.dimmed());
                }
                reply.accepted()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Mock backend push failed");
                false
            }
        }
    }

    /// Restart services; a failure is printed and the scenario goes on
    pub async fn restart_services(&self) {
        match self.lifecycle.restart().await {
            Ok(report) => {
                for (name, condition) in [
                    ("Websocket server", report.websocket),
                    ("WPEFramework", report.framework),
                ] {
                    match condition {
                        StartCondition::Ready { elapsed } => {
                            logging::info(&format!("{} ready after {:?}", name, elapsed));
                        }
                        StartCondition::Assumed { waited } => {
                            logging::info(&format!("{} started, waited {:?}", name, waited));
                        }
                        StartCondition::Degraded { waited } => {
                            logging::warning(&format!(
                                "{} not ready after {:?}; continuing",
                                name, waited
                            ));
                        }
                    }
                }
            }
            Err(e) => logging::error(&format!("Service restart failed: {}", e)),
        }
    }
}

/// Print the per-test block
fn print_result(id: &str, response: &str, status: Status, message: &str) {
    let status_text = match status {
        Status::Pass => status.as_str().green().bold(),
        Status::Fail => status.as_str().red().bold(),
    };
    println!("Testcase ID : {}", id);
    println!("Testcase Output Response : {}", response);
    println!("Testcase Status : {}", status_text);
    println!("Testcase Message : {}", message);
    println!();
}
