// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio output for streambot.
//!
//! [`AudioPlayer`] drains the playback queue one clip at a time, holding
//! clips back while the streamer's microphone is live. [`ProcessAudioFactory`]
//! plays clips by piping them into an external player program.

pub mod device;
pub mod player;

pub use device::{ProcessAudioDevice, ProcessAudioFactory};
pub use player::{AudioPlayer, PlayOutcome};
