//! HDMI-CEC conformance runner
//!
//! Drives the HdmiCec plugins of a WPEFramework instance over JSON-RPC,
//! steers a mock CEC backend, and records a CSV verdict per test case.

use std::path::PathBuf;

use cec_conformance::common::config::Config;
use cec_conformance::common::logging;
use cec_conformance::{cli, commands::Commands};
use clap::Parser;

#[derive(Parser)]
#[command(name = "cec-conformance", about = "HDMI-CEC plugin conformance runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: the per-user config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let guard = logging::init_cli(config.logging.dir.as_deref());
    let result = cli::dispatch(cli.command, config).await;
    // process::exit skips destructors; flush the run log first
    drop(guard);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
