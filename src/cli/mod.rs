//! CLI command handling
//!
//! Dispatches CLI commands and formats their output.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde_json::Value;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{logging, rule, Error, Result};
use crate::logs::{summarize, LogScraper};
use crate::mock::{MockApi, MockClient};
use crate::report::Reporter;
use crate::rpc::{curl_command, CommandRunner, Observed};
use crate::service::ServiceLifecycle;
use crate::testing::{Harness, TestScenario};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Run {
            files,
            verbose,
            report,
        } => run_scenarios(config, &files, verbose, report).await,

        Commands::Send { command } => {
            let observed = CommandRunner::from_config(&config.rpc).send(&command).await;
            print_observed(&observed);
            Ok(())
        }

        Commands::Call { method, params } => {
            let params = params
                .map(|p| serde_json::from_str::<Value>(&p))
                .transpose()?;
            let command = curl_command(&config.rpc, &method, params.as_ref())?;
            tracing::debug!(%command, "Calling");

            let observed = CommandRunner::from_config(&config.rpc).send(&command).await;
            print_observed(&observed);
            Ok(())
        }

        Commands::Push {
            device,
            api,
            message,
        } => {
            let pushes: Vec<(MockApi, PathBuf)> = [
                (MockApi::SetDeviceConfig, device),
                (MockApi::SetApiConfig, api),
                (MockApi::SendMessage, message),
            ]
            .into_iter()
            .filter_map(|(api, path)| path.map(|p| (api, p)))
            .collect();

            if pushes.is_empty() {
                return Err(Error::Config(
                    "nothing to push; pass --device, --api or --message".to_string(),
                ));
            }

            let client = MockClient::from_config(&config.mock)?;
            for (api, path) in pushes {
                let payload = read_json(&path)?;
                let reply = client.push(api, &payload).await?;
                if reply.accepted() {
                    logging::info(&format!("{} accepted ({})", api, reply.status));
                } else {
                    logging::error(&format!("{} rejected ({}): {}", api, reply.status, reply.body));
                }
            }
            Ok(())
        }

        Commands::Logs { lines, test_id } => {
            let scraper = LogScraper::from_config(&config.logs, &config.services);
            let capture = scraper.scrape(lines).await;
            for (source, outcome) in &capture.outcomes {
                tracing::debug!(source = %source, ?outcome, "Log probe");
            }
            println!(
                "{}",
                summarize(&capture.lines, test_id.as_deref(), &config.logs.marker)
            );
            Ok(())
        }

        Commands::Restart => {
            let report = ServiceLifecycle::new(config.services).restart().await?;
            println!("Websocket server: {:?}", report.websocket);
            println!("WPEFramework:     {:?}", report.framework);
            Ok(())
        }
    }
}

/// Run scenario files in order and print the summary
async fn run_scenarios(
    config: Config,
    files: &[PathBuf],
    verbose: bool,
    report: Option<PathBuf>,
) -> Result<()> {
    let report_path = report.unwrap_or_else(|| config.report.path.clone());
    let mut reporter = Reporter::new(report_path);
    let harness = Harness::from_config(config, verbose)?;

    println!("{}", rule('='));
    for path in files {
        let scenario = match TestScenario::load(path) {
            Ok(scenario) => scenario,
            Err(e) => {
                logging::error(&format!("{}: {}", path.display(), e));
                continue;
            }
        };
        // Skipped before any side effect: no restart, no pushes, no steps
        if reporter.is_recorded(&scenario.id) {
            logging::error(&format!(
                "{}: skipped, {}",
                path.display(),
                Error::DuplicateTestId(scenario.id.clone())
            ));
            continue;
        }

        tracing::info!(path = %path.display(), id = %scenario.id, "Running scenario");
        if let Err(e) = harness.run(&scenario, &mut reporter).await {
            match e {
                // A broken report invalidates every later row
                Error::ReportWrite { .. } => return Err(e),
                other => logging::error(&format!("{}: {}", path.display(), other)),
            }
        }
        println!("{}", rule('='));
    }

    let summary = reporter.summary();
    println!();
    println!("Passed: {}", summary.passed.len().to_string().green());
    for id in &summary.passed {
        println!("  {} {}", "✓".green(), id);
    }
    println!("Failed: {}", summary.failed.len().to_string().red());
    for id in &summary.failed {
        println!("  {} {}", "✗".red(), id);
    }
    if summary.total() > 0 {
        logging::highlight(&format!("Report written to {}", reporter.path().display()));
    }

    if summary.all_passed() {
        Ok(())
    } else {
        Err(Error::TestsFailed {
            failed: summary.failed.len(),
            total: summary.total(),
        })
    }
}

fn print_observed(observed: &Observed) {
    match observed {
        Observed::Response(line) => println!("{}", line),
        Observed::NoResponse { reason } => {
            println!("{}", observed);
            tracing::warn!(%reason, "No response");
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    Ok(serde_json::from_str(&content)?)
}
