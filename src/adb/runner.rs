use tokio::process::Command;
use tracing::debug;

use crate::error::BridgeError;

/// Single chokepoint for external command execution. Every device operation
/// goes through [`AdbRunner::run`]; nothing else spawns processes.
#[derive(Debug, Clone)]
pub struct AdbRunner {
    program: String,
}

/// Builds the argument tail: the device-selection flag is inserted iff a
/// non-empty device identifier was supplied; the caller's arguments follow
/// verbatim.
pub fn build_device_args(args: &[&str], device: &str) -> Vec<String> {
    let mut full = Vec::with_capacity(args.len() + 2);
    if !device.trim().is_empty() {
        full.push("-s".to_string());
        full.push(device.to_string());
    }
    full.extend(args.iter().map(|arg| arg.to_string()));
    full
}

impl AdbRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs one adb invocation and returns stdout exactly as captured,
    /// trailing whitespace included. A non-zero exit becomes a `Process`
    /// error whose message carries `STATUS: <code>` and the captured stderr
    /// verbatim. No timeout: a hung device operation blocks until the child
    /// exits.
    pub async fn run(
        &self,
        args: &[&str],
        device: &str,
        trace_id: &str,
    ) -> Result<String, BridgeError> {
        let full_args = build_device_args(args, device);
        debug!(trace_id = %trace_id, program = %self.program, args = ?full_args, "spawning adb");

        let output = Command::new(&self.program)
            .args(&full_args)
            .output()
            .await
            .map_err(|err| {
                BridgeError::io(format!("failed to spawn {}: {err}", self.program), trace_id)
            })?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BridgeError::process(
                format!("command failed, STATUS: {status} {stderr}"),
                trace_id,
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
