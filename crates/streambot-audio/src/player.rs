// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The sequential audio player.

use std::sync::Arc;
use std::time::Duration;

use streambot_bus::MicState;
use streambot_config::model::AudioConfig;
use streambot_core::{
    AudioDevice, AudioDeviceFactory, PlaybackRequest, StreambotError, User, WavClip,
};
use streambot_resilience::Backoff;
use streambot_storage::MutedSet;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How a single request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Completed,
    /// The author was muted while the clip played.
    Interrupted,
    /// The author was already muted when the clip came up.
    Skipped,
}

pub struct AudioPlayer {
    factory: Arc<dyn AudioDeviceFactory>,
    mic: Arc<MicState>,
    muted: Arc<MutedSet>,
    mic_poll: Duration,
    finish_poll: Duration,
}

impl AudioPlayer {
    pub fn new(
        config: &AudioConfig,
        factory: Arc<dyn AudioDeviceFactory>,
        mic: Arc<MicState>,
        muted: Arc<MutedSet>,
    ) -> Self {
        Self {
            factory,
            mic,
            muted,
            mic_poll: Duration::from_millis(config.mic_poll_ms.max(1)),
            finish_poll: Duration::from_millis(config.finish_poll_ms.max(1)),
        }
    }

    /// Plays queued requests until the playback queue closes.
    ///
    /// The device is reopened with backoff whenever opening or playing fails.
    pub async fn run(self, mut rx: mpsc::Receiver<PlaybackRequest>) {
        let mut backoff = Backoff::new("audio player");
        loop {
            backoff.attempt().await;
            let mut device = match self.factory.open().await {
                Ok(device) => device,
                Err(e) => {
                    warn!(error = %e, "couldn't initialize audio device");
                    continue;
                }
            };
            info!("audio device ready");

            loop {
                let Some(request) = rx.recv().await else {
                    debug!("playback queue closed, player exiting");
                    return;
                };
                match self.play(device.as_mut(), request).await {
                    Ok(outcome) => {
                        debug!(?outcome, "playback finished");
                        backoff.success();
                    }
                    Err(e) => {
                        warn!(error = %e, "playback failed, reopening audio device");
                        break;
                    }
                }
            }
        }
    }

    /// Plays one request: pre-play hook, microphone wait, the clip itself,
    /// then the post-play hook. The post-play hook runs even if playing fails.
    pub async fn play(
        &self,
        device: &mut dyn AudioDevice,
        request: PlaybackRequest,
    ) -> Result<PlayOutcome, StreambotError> {
        let PlaybackRequest {
            clip,
            pre_play,
            post_play,
            author,
        } = request;

        if let Some(hook) = pre_play {
            hook().await;
        }
        self.wait_for_mic_silence().await;
        let outcome = self.play_clip(device, &clip, author.as_ref()).await;
        if let Some(hook) = post_play {
            hook().await;
        }
        outcome
    }

    /// Blocks while the microphone is active and returns how long it waited.
    pub async fn wait_for_mic_silence(&self) -> Duration {
        if !self.mic.is_active() {
            return Duration::ZERO;
        }
        info!("waiting for mic silence");
        let start = Instant::now();
        while self.mic.is_active() {
            tokio::time::sleep(self.mic_poll).await;
        }
        let waited = start.elapsed();
        info!(waited_ms = waited.as_millis() as u64, "resuming playback");
        waited
    }

    async fn play_clip(
        &self,
        device: &mut dyn AudioDevice,
        clip: &WavClip,
        author: Option<&User>,
    ) -> Result<PlayOutcome, StreambotError> {
        let muted = |author: Option<&User>| author.is_some_and(|a| self.muted.is_muted(a));
        if muted(author) {
            debug!("author muted before playback, skipping clip");
            return Ok(PlayOutcome::Skipped);
        }
        device.play(clip).await?;
        while device.is_playing().await {
            if muted(author) {
                info!("author muted during playback, stopping clip");
                device.pause().await?;
                return Ok(PlayOutcome::Interrupted);
            }
            tokio::time::sleep(self.finish_poll).await;
        }
        Ok(PlayOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use futures::FutureExt;
    use streambot_test_utils::{AudioEvent, MockAudioFactory, twitch_user, wav_clip};

    struct Setup {
        player: AudioPlayer,
        factory: MockAudioFactory,
        mic: Arc<MicState>,
        muted: Arc<MutedSet>,
        _dir: tempfile::TempDir,
    }

    fn setup() -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockAudioFactory::new();
        let mic = Arc::new(MicState::default());
        let muted = Arc::new(MutedSet::empty(dir.path().join("muted.txt")));
        let player = AudioPlayer::new(
            &AudioConfig::default(),
            Arc::new(factory.clone()),
            mic.clone(),
            muted.clone(),
        );
        Setup {
            player,
            factory,
            mic,
            muted,
            _dir: dir,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clip_plays_to_completion() {
        let s = setup();
        let mut device = s.factory.open().await.unwrap();
        let start = Instant::now();
        let outcome = s
            .player
            .play(device.as_mut(), PlaybackRequest::new(wav_clip(500)))
            .await
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Completed);
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(s.factory.pauses(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn active_mic_delays_playback() {
        let s = setup();
        s.mic.set_active(true);
        let mic = s.mic.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            mic.set_active(false);
        });

        let start = Instant::now();
        let waited = s.player.wait_for_mic_silence().await;
        assert!(waited >= Duration::from_secs(2));
        assert!(waited < Duration::from_millis(2200));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn clip_starts_only_after_mic_clears() {
        let s = setup();
        s.mic.set_active(true);
        let cleared_at = Arc::new(Mutex::new(None));
        let (mic, cleared) = (s.mic.clone(), cleared_at.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            *cleared.lock().unwrap() = Some(Instant::now());
            mic.set_active(false);
        });

        let mut device = s.factory.open().await.unwrap();
        let outcome = s
            .player
            .play(device.as_mut(), PlaybackRequest::new(wav_clip(100)))
            .await
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Completed);

        let cleared = cleared_at.lock().unwrap().unwrap();
        let started: Vec<_> = s
            .factory
            .events()
            .into_iter()
            .filter_map(|e| match e {
                AudioEvent::Play { at, .. } => Some(at),
                _ => None,
            })
            .collect();
        assert_eq!(started.len(), 1);
        assert!(started[0] >= cleared);
    }

    #[tokio::test(start_paused = true)]
    async fn muting_author_stops_clip_early() {
        let s = setup();
        let alice = twitch_user("1", "Alice");
        let muted = s.muted.clone();
        let target = alice.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            muted.toggle(&target);
        });

        let mut device = s.factory.open().await.unwrap();
        let start = Instant::now();
        let outcome = s
            .player
            .play(
                device.as_mut(),
                PlaybackRequest::new(wav_clip(10_000)).with_author(alice),
            )
            .await
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Interrupted);
        assert_eq!(s.factory.pauses(), 1);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn already_muted_author_is_skipped() {
        let s = setup();
        let alice = twitch_user("1", "Alice");
        s.muted.toggle(&alice);
        let mut device = s.factory.open().await.unwrap();
        let outcome = s
            .player
            .play(
                device.as_mut(),
                PlaybackRequest::new(wav_clip(100)).with_author(alice),
            )
            .await
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Skipped);
        assert!(s.factory.play_times().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hooks_surround_playback() {
        let s = setup();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (pre, post) = (order.clone(), order.clone());
        let factory = s.factory.clone();
        let request = PlaybackRequest::new(wav_clip(100))
            .with_pre_play(move || {
                async move {
                    pre.lock().unwrap().push("pre");
                }
                .boxed()
            })
            .with_post_play(move || {
                async move {
                    // The clip has been played by the time this runs.
                    assert_eq!(factory.play_times().len(), 1);
                    post.lock().unwrap().push("post");
                }
                .boxed()
            });

        let mut device = s.factory.open().await.unwrap();
        s.player.play(device.as_mut(), request).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["pre", "post"]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_retries_device_and_plays_in_order() {
        let s = setup();
        s.factory.fail_opens(2);
        let (tx, rx) = mpsc::channel(20);
        for millis in [300, 200] {
            tx.send(PlaybackRequest::new(wav_clip(millis))).await.unwrap();
        }
        drop(tx);

        let start = Instant::now();
        s.player.run(rx).await;

        assert_eq!(s.factory.open_attempts(), 3);
        let plays: Vec<_> = s
            .factory
            .events()
            .into_iter()
            .filter_map(|e| match e {
                AudioEvent::Play { duration, at } => Some((duration, at)),
                _ => None,
            })
            .collect();
        assert_eq!(plays.len(), 2);
        // Two failed opens cost the first two backoff delays.
        assert!(plays[0].1 - start >= Duration::from_secs(6));
        assert!(plays[1].1 - plays[0].1 >= plays[0].0);
    }
}
