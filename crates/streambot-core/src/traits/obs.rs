// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OBS websocket collaborator.

use async_trait::async_trait;

use crate::error::StreambotError;
use crate::traits::adapter::PluginAdapter;

/// Per-input volume levels, one `[magnitude, peak, input_peak]` triple per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct InputLevels {
    pub name: String,
    pub levels: Vec<[f64; 3]>,
}

/// Events the connector reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ObsEvent {
    /// Periodic volume meter snapshot.
    VolumeMeters(Vec<InputLevels>),
    /// Program scene changed.
    SceneChanged(String),
}

#[async_trait]
pub trait ObsController: PluginAdapter {
    /// Connects and returns the current program scene.
    async fn connect(&mut self) -> Result<String, StreambotError>;

    /// Waits for the next event. `Ok(None)` means the connection closed.
    /// Must be cancel-safe.
    async fn next_event(&self) -> Result<Option<ObsEvent>, StreambotError>;

    /// Switches the program scene.
    async fn switch_scene(&self, scene: &str) -> Result<(), StreambotError>;
}
