// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Launches the synthesis backend through a shell.

use async_trait::async_trait;
use streambot_core::traits::ProcessHandle;
use streambot_core::{RemoteLauncher, StreambotError};
use tokio::process::Command;
use tracing::{debug, info};

/// Placeholder in the stop command replaced with the launch handle.
pub const HANDLE_PLACEHOLDER: &str = "{handle}";

/// Runs commands with `sh -c`.
///
/// The start command must print a handle (typically a PID) on stdout and
/// return; the stop command receives it through `{handle}`. Either may
/// wrap `ssh` to reach another machine.
#[derive(Debug, Clone, Default)]
pub struct ShellLauncher {
    stop_command: Option<String>,
}

impl ShellLauncher {
    pub fn new(stop_command: Option<String>) -> Self {
        Self { stop_command }
    }
}

async fn run_shell(command: &str) -> Result<String, StreambotError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| StreambotError::Internal(format!("failed to spawn shell: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(StreambotError::Internal(format!(
            "`{command}` exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[async_trait]
impl RemoteLauncher for ShellLauncher {
    async fn start(&self, command: &str) -> Result<ProcessHandle, StreambotError> {
        let handle = run_shell(command).await?;
        info!(%handle, "launched synthesis backend");
        Ok(ProcessHandle(handle))
    }

    async fn stop(&self, handle: &ProcessHandle) -> Result<(), StreambotError> {
        let Some(template) = &self.stop_command else {
            debug!(handle = %handle.0, "no stop command configured");
            return Ok(());
        };
        let command = template.replace(HANDLE_PLACEHOLDER, &handle.0);
        run_shell(&command).await?;
        info!(handle = %handle.0, "stopped synthesis backend");
        Ok(())
    }
}
