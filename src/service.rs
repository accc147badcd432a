//! Local command execution and lifecycle-manager service control.

use anyhow::{Context, Result};
use std::process::{Command, Output};
use std::thread;
use std::time::{Duration, Instant};

/// Name of the lifecycle manager's systemd unit.
pub const LCM_SERVICE: &str = "lcm";

/// Interval between readiness polls.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Run a local command, logging stdout at debug and stderr at error.
pub fn run(cmd: &str, args: &[&str]) -> Result<Output> {
    log::debug!("RUN: {cmd} {args:?}");
    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute: {cmd} {args:?}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        log::debug!("{}", stdout.trim());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        log::error!("{}", stderr.trim());
    }
    log::debug!("EXIT {:?}", output.status.code());
    Ok(output)
}

/// Restart a systemd service.
pub fn restart(service: &str) -> Result<()> {
    let output = run("systemctl", &["restart", service])?;
    if !output.status.success() {
        anyhow::bail!("systemctl restart {service} exited with {}", output.status);
    }
    Ok(())
}

/// Poll `systemctl is-active` until the service reports active or the
/// timeout elapses. Returns whether the service came up.
pub fn wait_active(service: &str, timeout: Duration) -> Result<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        let output = run("systemctl", &["is-active", service])?;
        if output.status.success() {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
