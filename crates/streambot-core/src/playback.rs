// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playback requests handed from the TTS pipeline to the audio player.

use futures::future::BoxFuture;

use crate::types::User;
use crate::wav::WavClip;

/// A hook run by the audio player around a clip. It may suspend (for example
/// to let an overlay animation finish before audio starts).
pub type PlaybackHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Audio payload plus optional hooks and author reference.
///
/// The author lets a mid-playback mute interrupt this specific clip.
pub struct PlaybackRequest {
    pub clip: WavClip,
    pub pre_play: Option<PlaybackHook>,
    pub post_play: Option<PlaybackHook>,
    pub author: Option<User>,
}

impl PlaybackRequest {
    pub fn new(clip: WavClip) -> Self {
        Self {
            clip,
            pre_play: None,
            post_play: None,
            author: None,
        }
    }

    pub fn with_author(mut self, author: User) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_pre_play<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, ()> + Send + 'static,
    {
        self.pre_play = Some(Box::new(hook));
        self
    }

    pub fn with_post_play<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, ()> + Send + 'static,
    {
        self.post_play = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for PlaybackRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackRequest")
            .field("clip", &self.clip)
            .field("pre_play", &self.pre_play.is_some())
            .field("post_play", &self.post_play.is_some())
            .field("author", &self.author.as_ref().map(User::key))
            .finish()
    }
}
