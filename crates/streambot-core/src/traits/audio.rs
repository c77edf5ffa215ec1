// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio output device.

use async_trait::async_trait;

use crate::error::StreambotError;
use crate::wav::WavClip;

/// A device that plays one clip at a time.
#[async_trait]
pub trait AudioDevice: Send {
    /// Starts playing `clip`. Returns once playback has begun.
    async fn play(&mut self, clip: &WavClip) -> Result<(), StreambotError>;

    /// Whether the last clip is still playing.
    async fn is_playing(&mut self) -> bool;

    /// Stops the current clip. There is no resume.
    async fn pause(&mut self) -> Result<(), StreambotError>;
}

/// Opens audio devices; the player reopens with backoff when this fails.
#[async_trait]
pub trait AudioDeviceFactory: Send + Sync + 'static {
    async fn open(&self) -> Result<Box<dyn AudioDevice>, StreambotError>;
}
