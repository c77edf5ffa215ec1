// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-speech backend trait.

use async_trait::async_trait;

use crate::error::StreambotError;
use crate::traits::adapter::PluginAdapter;
use crate::wav::WavClip;

/// A single synthesis job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    /// Narrator voice for text outside quotes; `None` disables narration.
    pub narrator_voice: Option<String>,
}

#[async_trait]
pub trait SynthesisBackend: PluginAdapter {
    /// Generates a complete waveform for `request`.
    async fn generate(&self, request: &SynthesisRequest) -> Result<WavClip, StreambotError>;

    /// Lists the voices the backend can synthesize with.
    async fn voices(&self) -> Result<Vec<String>, StreambotError>;
}
