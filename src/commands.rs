//! CLI command definitions
//!
//! Defines the clap commands for the conformance runner.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run test scenarios defined in YAML files
    Run {
        /// Scenario files, executed in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// CSV report path (overrides the config file)
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Run a shell command and print the JSON response it produced
    Send {
        /// Complete command line, e.g. a curl invocation
        command: String,
    },

    /// Call a JSON-RPC method on the framework
    Call {
        /// Method name, e.g. org.rdk.HdmiCecSink.getActiveSource
        method: String,

        /// Parameters as a JSON object
        #[arg(long)]
        params: Option<String>,
    },

    /// Push configuration or messages to the mock backend
    Push {
        /// JSON file for Database.setDeviceConfig
        #[arg(long)]
        device: Option<PathBuf>,

        /// JSON file for Hdmicec.setAPIConfig
        #[arg(long)]
        api: Option<PathBuf>,

        /// JSON file for Hdmicec.sendMessage
        #[arg(long)]
        message: Option<PathBuf>,
    },

    /// Show classified framework logs
    Logs {
        /// Number of trailing lines to read from each source
        #[arg(long, short = 'n', default_value = "100")]
        lines: usize,

        /// Test case id for the header
        #[arg(long)]
        test_id: Option<String>,
    },

    /// Restart the framework and the websocket server
    Restart,
}
