//! Service lifecycle
//!
//! Stops the framework and the websocket server, then brings both back.
//! After each start the helper polls the service port instead of trusting a
//! fixed delay; a service that does not come up in time is reported as
//! degraded and the run carries on.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::process::Command;

use crate::common::config::{Readiness, ServicesConfig};
use crate::common::{Error, Result};

/// Delay used when readiness polling is turned off
const FIXED_DELAY: Duration = Duration::from_secs(5);

/// First backoff step between readiness probes
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Backoff ceiling
const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Time allowed for a single connection attempt
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// How a service came up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartCondition {
    /// Port accepted a connection
    Ready { elapsed: Duration },
    /// Port never accepted a connection before the deadline
    Degraded { waited: Duration },
    /// Fixed delay elapsed; readiness was not checked
    Assumed { waited: Duration },
}

impl StartCondition {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StartCondition::Degraded { .. })
    }
}

/// Start conditions of both services after a restart
#[derive(Debug, Clone, Copy)]
pub struct RestartReport {
    pub websocket: StartCondition,
    pub framework: StartCondition,
}

/// Poll `addr` with exponential backoff until it accepts a connection
pub async fn wait_until_ready(addr: SocketAddr, timeout: Duration) -> StartCondition {
    let start = Instant::now();
    let deadline = start + timeout;
    let mut backoff = INITIAL_BACKOFF;

    loop {
        if let Ok(Ok(_)) = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
            let elapsed = start.elapsed();
            tracing::debug!(%addr, ?elapsed, "Service is accepting connections");
            return StartCondition::Ready { elapsed };
        }

        let now = Instant::now();
        if now >= deadline {
            return StartCondition::Degraded {
                waited: start.elapsed(),
            };
        }
        tokio::time::sleep(backoff.min(deadline - now)).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// Spawn `program` detached from this process, working in `dir`
///
/// The child runs in its own process group. A watcher thread waits on it so
/// a short-lived script is reaped as soon as it exits. Returns the pid.
fn spawn_detached(program: &str, args: &[&str], dir: &Path) -> Result<u32> {
    let mut cmd = std::process::Command::new(program);
    cmd.args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(|e| Error::service_spawn(program, e))?;
    let pid = child.id();
    tracing::debug!(program, pid, "Spawned");

    let name = program.to_string();
    std::thread::Builder::new()
        .name(format!("reap-{pid}"))
        .spawn(move || match child.wait() {
            Ok(status) => tracing::debug!(program = %name, pid, code = ?status.code(), "Exited"),
            Err(e) => tracing::warn!(program = %name, pid, error = %e, "Failed to wait"),
        })
        .map_err(|e| Error::service_spawn(program, e))?;
    Ok(pid)
}

/// Add the execute bits, like `chmod +x`
#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)
        .map_err(|e| Error::file_read(path, e))?
        .permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms).map_err(Error::Io)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Restarts the framework and websocket server between scenarios
#[derive(Debug, Clone)]
pub struct ServiceLifecycle {
    config: ServicesConfig,
}

impl ServiceLifecycle {
    pub fn new(config: ServicesConfig) -> Self {
        Self { config }
    }

    /// Stop both services; missing tools and failures are only logged
    pub async fn terminate(&self) {
        let rpc_port = format!("{}/tcp", self.config.rpc_port);
        let websocket_port = format!("{}/tcp", self.config.websocket_port);

        // SIGQUIT first so the framework can flush coverage data
        run_quietly("killall", &["-QUIT", self.config.framework_process.as_str()]).await;
        run_quietly("fuser", &["-k", rpc_port.as_str()]).await;
        run_quietly("fuser", &["-k", websocket_port.as_str()]).await;
    }

    /// Start the websocket server, then the framework restart script
    pub async fn start(&self) -> Result<RestartReport> {
        let cfg = &self.config;

        spawn_detached("python3", &[cfg.websocket_script.as_str()], &cfg.websocket_dir)?;
        let websocket = self.await_service(cfg.websocket_port).await;

        let script = cfg.restart_dir.join(&cfg.restart_script);
        make_executable(&script)?;
        let local = format!("./{}", cfg.restart_script);
        spawn_detached(&local, &[], &cfg.restart_dir)?;
        let framework = self.await_service(cfg.rpc_port).await;

        Ok(RestartReport {
            websocket,
            framework,
        })
    }

    /// Stop and start both services
    pub async fn restart(&self) -> Result<RestartReport> {
        tracing::info!("Restarting services");
        self.terminate().await;
        let report = self.start().await?;
        for (name, condition) in [("websocket", report.websocket), ("framework", report.framework)] {
            if condition.is_degraded() {
                tracing::warn!(service = name, ?condition, "Service did not become ready");
            }
        }
        Ok(report)
    }

    async fn await_service(&self, port: u16) -> StartCondition {
        match self.config.readiness {
            Readiness::FixedDelay => {
                tokio::time::sleep(FIXED_DELAY).await;
                StartCondition::Assumed {
                    waited: FIXED_DELAY,
                }
            }
            Readiness::Poll => {
                let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
                wait_until_ready(addr, Duration::from_secs(self.config.ready_timeout_secs)).await
            }
        }
    }
}

/// Run a management tool, logging instead of failing
async fn run_quietly(program: &str, args: &[&str]) {
    if which::which(program).is_err() {
        tracing::warn!(program, "Not installed, skipping");
        return;
    }
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) => tracing::debug!(program, ?args, code = ?status.code(), "Ran"),
        Err(e) => tracing::warn!(program, error = %e, "Failed to run"),
    }
}
