// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote process launch collaborator, used to start the synthesis backend.

use async_trait::async_trait;

use crate::error::StreambotError;

/// Opaque handle of a launched process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle(pub String);

#[async_trait]
pub trait RemoteLauncher: Send + Sync + 'static {
    /// Starts `command` and returns a handle usable with [`stop`](Self::stop).
    async fn start(&self, command: &str) -> Result<ProcessHandle, StreambotError>;

    /// Stops a previously started process.
    async fn stop(&self, handle: &ProcessHandle) -> Result<(), StreambotError>;
}
