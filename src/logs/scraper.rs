//! Best-effort log scraping
//!
//! Each source is a [`LogProbe`] that either finds lines or says why it
//! could not. The scraper runs every probe in order and concatenates what
//! was found; a probe that fails never stops the ones after it.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::common::config::{LogsConfig, ServicesConfig};
use crate::common::tail;

/// Time allowed for a journalctl query
const JOURNAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for each process/port listing
const LISTING_TIMEOUT: Duration = Duration::from_secs(3);

/// Result of asking one source for logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found(Vec<String>),
    Unavailable(String),
}

/// A single log source
#[async_trait]
pub trait LogProbe: Send + Sync {
    /// Short name shown in diagnostics
    fn name(&self) -> String;

    /// Fetch at most the last `lines` lines
    async fn probe(&self, lines: usize) -> ProbeOutcome;
}

/// Everything a scrape produced
#[derive(Debug, Default)]
pub struct LogCapture {
    /// Lines from all sources, in probe order
    pub lines: Vec<String>,
    /// Per-probe outcome, for diagnostics
    pub outcomes: Vec<(String, ProbeOutcome)>,
}

impl LogCapture {
    /// True when no source yielded anything, i.e. logs are unavailable
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Runs the probe chain
pub struct LogScraper {
    probes: Vec<Box<dyn LogProbe>>,
}

impl LogScraper {
    pub fn new(probes: Vec<Box<dyn LogProbe>>) -> Self {
        Self { probes }
    }

    /// Standard chain: primary file, journal, port check, fallback files
    pub fn from_config(logs: &LogsConfig, services: &ServicesConfig) -> Self {
        let mut probes: Vec<Box<dyn LogProbe>> = Vec::new();
        probes.push(Box::new(PrimaryFileProbe {
            path: logs.primary_path.clone(),
        }));
        probes.push(Box::new(JournalProbe {
            unit: logs.journal_unit.clone(),
        }));
        probes.push(Box::new(PortProbe {
            port: services.rpc_port,
            process: services.framework_process.clone(),
        }));
        probes.push(Box::new(FallbackFilesProbe {
            paths: logs.fallback_paths.clone(),
        }));
        Self::new(probes)
    }

    /// Collect up to `lines` recent lines from each source
    pub async fn scrape(&self, lines: usize) -> LogCapture {
        let mut capture = LogCapture::default();
        for probe in &self.probes {
            let outcome = probe.probe(lines).await;
            match &outcome {
                ProbeOutcome::Found(found) => {
                    tracing::debug!(probe = %probe.name(), lines = found.len(), "Log source found");
                    capture.lines.extend(found.iter().cloned());
                }
                ProbeOutcome::Unavailable(reason) => {
                    tracing::debug!(probe = %probe.name(), reason = %reason, "Log source unavailable");
                }
            }
            capture.outcomes.push((probe.name(), outcome));
        }
        capture
    }
}

/// Read the last `lines` lines of a text file
async fn read_tail(path: &Path, lines: usize) -> Result<Vec<String>, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    let text = String::from_utf8_lossy(&bytes);
    let all: Vec<String> = text.lines().map(str::to_string).collect();
    Ok(tail(&all, lines).to_vec())
}

/// Run a listing tool with a deadline
async fn run_tool(program: &str, args: &[&str], limit: Duration) -> Result<Output, String> {
    which::which(program).map_err(|_| format!("{} not installed", program))?;

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(limit, child).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(format!("{} failed to run: {}", program, e)),
        Err(_) => Err(format!("{} timed out", program)),
    }
}

/// The configured framework log file
pub struct PrimaryFileProbe {
    pub path: Option<PathBuf>,
}

#[async_trait]
impl LogProbe for PrimaryFileProbe {
    fn name(&self) -> String {
        "primary log file".to_string()
    }

    async fn probe(&self, lines: usize) -> ProbeOutcome {
        let Some(path) = &self.path else {
            return ProbeOutcome::Unavailable("no primary log path configured".to_string());
        };
        match read_tail(path, lines).await {
            Ok(found) => ProbeOutcome::Found(found),
            Err(e) => ProbeOutcome::Unavailable(e),
        }
    }
}

/// `journalctl -u <unit>`
pub struct JournalProbe {
    pub unit: String,
}

#[async_trait]
impl LogProbe for JournalProbe {
    fn name(&self) -> String {
        format!("journal ({})", self.unit)
    }

    async fn probe(&self, lines: usize) -> ProbeOutcome {
        let count = lines.to_string();
        let args = ["-u", self.unit.as_str(), "-n", count.as_str(), "--no-pager"];
        match run_tool("journalctl", &args, JOURNAL_TIMEOUT).await {
            Ok(output) if output.status.success() => {
                let text = String::from_utf8_lossy(&output.stdout);
                let all: Vec<String> = text.split('\n').map(str::to_string).collect();
                ProbeOutcome::Found(tail(&all, lines).to_vec())
            }
            Ok(output) => ProbeOutcome::Unavailable(format!(
                "journalctl exited with {:?}",
                output.status.code()
            )),
            Err(e) => ProbeOutcome::Unavailable(e),
        }
    }
}

/// Notes whether the framework process holds its RPC port
pub struct PortProbe {
    pub port: u16,
    pub process: String,
}

#[async_trait]
impl LogProbe for PortProbe {
    fn name(&self) -> String {
        format!("port {}", self.port)
    }

    async fn probe(&self, _lines: usize) -> ProbeOutcome {
        let target = format!("-ti:{}", self.port);
        let holders = match run_tool("lsof", &[target.as_str()], LISTING_TIMEOUT).await {
            Ok(output) => output,
            Err(e) => return ProbeOutcome::Unavailable(e),
        };
        if !holders.status.success() || String::from_utf8_lossy(&holders.stdout).trim().is_empty() {
            return ProbeOutcome::Unavailable(format!("nothing listening on port {}", self.port));
        }

        let listing = match run_tool("ps", &["aux"], LISTING_TIMEOUT).await {
            Ok(output) => output,
            Err(e) => return ProbeOutcome::Unavailable(e),
        };
        if String::from_utf8_lossy(&listing.stdout).contains(&self.process) {
            ProbeOutcome::Found(vec![format!(
                "{} process is running on port {}",
                self.process, self.port
            )])
        } else {
            ProbeOutcome::Unavailable(format!("{} not in process list", self.process))
        }
    }
}

/// Well-known log locations; the first readable one wins
pub struct FallbackFilesProbe {
    pub paths: Vec<PathBuf>,
}

#[async_trait]
impl LogProbe for FallbackFilesProbe {
    fn name(&self) -> String {
        "fallback log files".to_string()
    }

    async fn probe(&self, lines: usize) -> ProbeOutcome {
        let mut misses = Vec::new();
        for path in &self.paths {
            if !path.exists() {
                continue;
            }
            match read_tail(path, lines).await {
                Ok(found) => return ProbeOutcome::Found(found),
                Err(e) => misses.push(e),
            }
        }
        if misses.is_empty() {
            ProbeOutcome::Unavailable("no fallback log file exists".to_string())
        } else {
            ProbeOutcome::Unavailable(misses.join("; "))
        }
    }
}
