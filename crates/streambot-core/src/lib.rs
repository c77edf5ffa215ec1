// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for streambot.
//!
//! Error type, domain types and the collaborator traits every other crate in
//! the workspace builds on.

pub mod error;
pub mod html;
pub mod playback;
pub mod traits;
pub mod types;
pub mod wav;

pub use error::StreambotError;
pub use playback::{PlaybackHook, PlaybackRequest};
pub use types::{
    Account, Alert, Attachment, CallEnvelope, ChatEntry, HealthStatus, InboundChat, Platform,
    PlatformCommand, PlatformMessageId, User,
};
pub use wav::WavClip;

pub use traits::{
    AudioDevice, AudioDeviceFactory, Broadcaster, ClientId, ObsController, PlatformAdapter,
    PluginAdapter, RemoteLauncher, SynthesisBackend,
};
