// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Closed message variants carried by each queue.

use streambot_core::{Alert, ChatEntry, ClientId, StreambotError};
use tokio::sync::oneshot;

/// Inbound work for the chat aggregator.
#[derive(Debug)]
pub enum AggregatorMessage {
    /// A rendered chat or system entry to ingest.
    Chat(ChatEntry),
    /// Updates the "now playing" line shown on the overlay.
    AudioMessage(String),
    /// Updates the stream title shown on the overlay.
    StreamTitle(String),
    /// A web client connected and needs the current state replayed.
    ClientConnected(ClientId),
}

/// Inbound work for the TTS pipeline.
#[derive(Debug)]
pub enum TtsMessage {
    Chat(ChatEntry),
    Alert(Alert),
}

/// Commands for the OBS connector.
#[derive(Debug)]
pub enum ObsCommand {
    SwitchScene {
        scene: String,
        reply: Option<oneshot::Sender<Result<(), StreambotError>>>,
    },
}
