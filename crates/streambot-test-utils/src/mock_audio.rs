// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock audio devices that "play" for the clip's duration on the tokio clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use streambot_core::traits::{AudioDevice, AudioDeviceFactory};
use streambot_core::{StreambotError, WavClip};

/// What happened on a mock device, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Opened,
    Play {
        duration: Duration,
        at: Instant,
    },
    Pause {
        at: Instant,
    },
}

/// Opens [`MockAudioDevice`]s sharing one event log.
#[derive(Clone, Default)]
pub struct MockAudioFactory {
    events: Arc<Mutex<Vec<AudioEvent>>>,
    open_failures: Arc<AtomicUsize>,
    open_attempts: Arc<AtomicUsize>,
}

impl MockAudioFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` opens fail.
    pub fn fail_opens(&self, n: usize) {
        self.open_failures.store(n, Ordering::SeqCst);
    }

    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Start instants of every played clip.
    pub fn play_times(&self) -> Vec<Instant> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AudioEvent::Play { at, .. } => Some(at),
                _ => None,
            })
            .collect()
    }

    pub fn pauses(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, AudioEvent::Pause { .. }))
            .count()
    }

    fn record(&self, event: AudioEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl AudioDeviceFactory for MockAudioFactory {
    async fn open(&self) -> Result<Box<dyn AudioDevice>, StreambotError> {
        self.open_attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.open_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.open_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StreambotError::audio("mock device unavailable"));
        }
        self.record(AudioEvent::Opened);
        Ok(Box::new(MockAudioDevice {
            factory: self.clone(),
            playing_until: None,
        }))
    }
}

/// A device that reports playing until the clip's duration has elapsed.
pub struct MockAudioDevice {
    factory: MockAudioFactory,
    playing_until: Option<Instant>,
}

#[async_trait]
impl AudioDevice for MockAudioDevice {
    async fn play(&mut self, clip: &WavClip) -> Result<(), StreambotError> {
        let now = Instant::now();
        self.playing_until = Some(now + clip.duration());
        self.factory.record(AudioEvent::Play {
            duration: clip.duration(),
            at: now,
        });
        Ok(())
    }

    async fn is_playing(&mut self) -> bool {
        self.playing_until.is_some_and(|t| Instant::now() < t)
    }

    async fn pause(&mut self) -> Result<(), StreambotError> {
        self.playing_until = None;
        self.factory.record(AudioEvent::Pause { at: Instant::now() });
        Ok(())
    }
}
