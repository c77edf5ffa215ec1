// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by every external collaborator.

use async_trait::async_trait;

use crate::error::StreambotError;
use crate::types::HealthStatus;

/// Identity and health for a collaborator.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this collaborator instance.
    fn name(&self) -> &str;

    /// Performs a lightweight health check.
    async fn health_check(&self) -> Result<HealthStatus, StreambotError>;
}
