// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The streambot message bus.
//!
//! A fixed set of bounded queues, one per concern. Queues feeding the slow
//! consumers (synthesis and playback) are small and drop on full; the
//! aggregator, platform and OBS queues are larger and may apply
//! back-pressure to their producers.

pub mod messages;
pub mod queue;
pub mod signals;

use std::collections::HashMap;
use std::sync::Arc;

use streambot_config::model::BusConfig;
use streambot_core::{
    Alert, ChatEntry, ClientId, Platform, PlatformCommand, PlaybackRequest, StreambotError,
};
use tokio::sync::mpsc;

pub use messages::{AggregatorMessage, ObsCommand, TtsMessage};
pub use queue::{BoundedQueue, SendOutcome};
pub use signals::{CurrentScene, MicState, Signals, VoiceCatalog};

/// Producer side of every queue plus the shared signals. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MessageBus {
    aggregator: BoundedQueue<AggregatorMessage>,
    tts: BoundedQueue<TtsMessage>,
    playback: BoundedQueue<PlaybackRequest>,
    platforms: Arc<HashMap<Platform, BoundedQueue<PlatformCommand>>>,
    obs: BoundedQueue<ObsCommand>,
    signals: Signals,
}

/// Consumer ends, handed to the task that owns each queue.
#[derive(Debug)]
pub struct BusReceivers {
    pub aggregator: mpsc::Receiver<AggregatorMessage>,
    pub tts: mpsc::Receiver<TtsMessage>,
    pub playback: mpsc::Receiver<PlaybackRequest>,
    pub platforms: HashMap<Platform, mpsc::Receiver<PlatformCommand>>,
    pub obs: mpsc::Receiver<ObsCommand>,
}

impl MessageBus {
    pub fn new(config: &BusConfig) -> (Self, BusReceivers) {
        let (aggregator, aggregator_rx) =
            BoundedQueue::new("aggregator", config.aggregator_capacity);
        let (tts, tts_rx) = BoundedQueue::new("tts", config.tts_capacity);
        let (playback, playback_rx) = BoundedQueue::new("playback", config.playback_capacity);
        let (obs, obs_rx) = BoundedQueue::new("obs", config.obs_capacity);

        let mut platforms = HashMap::new();
        let mut platform_rxs = HashMap::new();
        for platform in Platform::ALL {
            let name = match platform {
                Platform::Twitch => "twitch",
                Platform::YouTube => "youtube",
                Platform::Discord => "discord",
            };
            let (queue, rx) = BoundedQueue::new(name, config.platform_capacity);
            platforms.insert(platform, queue);
            platform_rxs.insert(platform, rx);
        }

        let bus = Self {
            aggregator,
            tts,
            playback,
            platforms: Arc::new(platforms),
            obs,
            signals: Signals::default(),
        };
        let receivers = BusReceivers {
            aggregator: aggregator_rx,
            tts: tts_rx,
            playback: playback_rx,
            platforms: platform_rxs,
            obs: obs_rx,
        };
        (bus, receivers)
    }

    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    /// Enqueues a chat entry for aggregation, waiting for room.
    pub async fn enqueue_chat(&self, entry: ChatEntry) -> Result<(), StreambotError> {
        self.aggregator.send(AggregatorMessage::Chat(entry)).await
    }

    /// Enqueues a chat entry for aggregation without waiting.
    pub fn try_enqueue_chat(&self, entry: ChatEntry) -> SendOutcome {
        self.aggregator.try_send(AggregatorMessage::Chat(entry))
    }

    /// Queues an alert for synthesis; dropped when the TTS queue is full.
    pub fn enqueue_alert(&self, alert: Alert) -> SendOutcome {
        self.tts.try_send(TtsMessage::Alert(alert))
    }

    /// Queues a chat entry for synthesis; dropped when the TTS queue is full.
    pub fn enqueue_tts(&self, entry: ChatEntry) -> SendOutcome {
        self.tts.try_send(TtsMessage::Chat(entry))
    }

    /// Queues a clip for playback; dropped when the playback queue is full.
    pub fn enqueue_playback(&self, request: PlaybackRequest) -> SendOutcome {
        self.playback.try_send(request)
    }

    /// Sends an aggregator control message, waiting for room.
    pub async fn aggregator(&self, msg: AggregatorMessage) -> Result<(), StreambotError> {
        self.aggregator.send(msg).await
    }

    /// Sends a command to a platform connector, waiting for room.
    pub async fn platform_command(
        &self,
        platform: Platform,
        command: PlatformCommand,
    ) -> Result<(), StreambotError> {
        match self.platforms.get(&platform) {
            Some(queue) => queue.send(command).await,
            None => Err(StreambotError::QueueClosed {
                queue: platform.to_string(),
            }),
        }
    }

    /// Sends a command to a platform connector without waiting.
    pub fn try_platform_command(&self, platform: Platform, command: PlatformCommand) -> SendOutcome {
        match self.platforms.get(&platform) {
            Some(queue) => queue.try_send(command),
            None => SendOutcome::Dropped,
        }
    }

    /// Sends a command to the OBS connector, waiting for room.
    pub async fn obs_command(&self, command: ObsCommand) -> Result<(), StreambotError> {
        self.obs.send(command).await
    }

    /// Convenience for the aggregator's replay request.
    pub async fn client_connected(&self, client: ClientId) -> Result<(), StreambotError> {
        self.aggregator(AggregatorMessage::ClientConnected(client))
            .await
    }
}
