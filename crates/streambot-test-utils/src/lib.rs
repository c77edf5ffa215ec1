// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for fast, deterministic streambot tests.
//!
//! - [`MockPlatform`]: injectable chat, captured commands
//! - [`MockSynthesizer`] and [`MockLauncher`]: a synthesis backend that can
//!   be down until "launched"
//! - [`MockAudioFactory`]: devices that play for the clip's duration on the
//!   tokio clock
//! - [`MockObs`]: scripted OBS events
//! - [`RecordingBroadcaster`]: captures every web call

pub mod mock_audio;
pub mod mock_obs;
pub mod mock_platform;
pub mod mock_synth;
pub mod recording;

pub use mock_audio::{AudioEvent, MockAudioFactory};
pub use mock_obs::MockObs;
pub use mock_platform::MockPlatform;
pub use mock_synth::{MockLauncher, MockSynthesizer};
pub use recording::{RecordedCall, RecordingBroadcaster};

use streambot_core::WavClip;
use streambot_core::types::{TwitchUser, User, YouTubeUser};

/// A silent mono clip lasting `millis` milliseconds.
pub fn wav_clip(millis: u32) -> WavClip {
    match streambot_core::wav::silence(8000, millis * 8) {
        Ok(clip) => clip,
        Err(e) => panic!("fixture WAV failed to encode: {e}"),
    }
}

/// A Twitch user with id `id` and display name `name`.
pub fn twitch_user(id: &str, name: &str) -> User {
    User::Twitch(TwitchUser {
        id: id.to_string(),
        login: name.to_lowercase(),
        name: name.to_string(),
        color: None,
    })
}

/// A YouTube user with channel id `id` and display name `name`.
pub fn youtube_user(id: &str, name: &str) -> User {
    User::YouTube(YouTubeUser {
        channel_id: id.to_string(),
        name: name.to_string(),
    })
}
