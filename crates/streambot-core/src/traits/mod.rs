// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the edges of the streambot core.
//!
//! Platform SDKs, the synthesis backend, the remote launcher, the audio
//! device and OBS are all reached through these traits so the core can be
//! tested against mocks.

pub mod adapter;
pub mod audio;
pub mod broadcast;
pub mod launcher;
pub mod obs;
pub mod platform;
pub mod synthesis;

pub use adapter::PluginAdapter;
pub use audio::{AudioDevice, AudioDeviceFactory};
pub use broadcast::{Broadcaster, ClientId};
pub use launcher::{ProcessHandle, RemoteLauncher};
pub use obs::{InputLevels, ObsController, ObsEvent};
pub use platform::PlatformAdapter;
pub use synthesis::{SynthesisBackend, SynthesisRequest};
