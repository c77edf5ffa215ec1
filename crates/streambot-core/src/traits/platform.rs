// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform chat source trait (Twitch, YouTube, Discord).

use async_trait::async_trait;

use crate::error::StreambotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundChat, Platform, PlatformCommand};

/// A bidirectional connection to one streaming platform.
///
/// The connector loop owns the adapter; `receive` and `execute` take `&self`
/// so a connector can wait for chat and commands at the same time.
#[async_trait]
pub trait PlatformAdapter: PluginAdapter {
    /// The platform this adapter serves.
    fn platform(&self) -> Platform;

    /// Establishes (or re-establishes) the upstream connection.
    async fn connect(&mut self) -> Result<(), StreambotError>;

    /// Waits for the next inbound chat message.
    ///
    /// `Ok(None)` means the upstream stream ended and the connector should
    /// reconnect. Must be cancel-safe.
    async fn receive(&self) -> Result<Option<InboundChat>, StreambotError>;

    /// Executes a moderation or channel command upstream.
    async fn execute(&self, command: PlatformCommand) -> Result<(), StreambotError>;
}
