// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command feeds for out-of-process bridges.
//!
//! Platform and OBS command queues that no in-process connector consumes
//! are parked here. A bridge long-polls `GET /v1/commands/{feed}` and
//! executes what it receives against the real service.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use streambot_bus::ObsCommand;
use streambot_core::{Platform, PlatformCommand};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

/// Feed name for OBS commands.
pub const OBS_FEED: &str = "obs";
/// Longest a poll waits for the first command.
pub const MAX_POLL_WAIT: Duration = Duration::from_secs(30);
/// Most commands returned by one poll.
pub const MAX_BATCH: usize = 32;

/// OBS command as handed to a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObsDirective {
    SwitchScene { scene: String },
}

impl From<ObsCommand> for ObsDirective {
    fn from(command: ObsCommand) -> Self {
        match command {
            ObsCommand::SwitchScene { scene, reply } => {
                // Handing the command over is the best acknowledgement
                // available for a remote executor.
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(()));
                }
                ObsDirective::SwitchScene { scene }
            }
        }
    }
}

/// Unclaimed command receivers, one per feed.
#[derive(Debug, Default)]
pub struct BridgeOutbox {
    platforms: HashMap<Platform, Mutex<mpsc::Receiver<PlatformCommand>>>,
    obs: Option<Mutex<mpsc::Receiver<ObsCommand>>>,
}

impl BridgeOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platforms(
        mut self,
        receivers: HashMap<Platform, mpsc::Receiver<PlatformCommand>>,
    ) -> Self {
        for (platform, rx) in receivers {
            self.platforms.insert(platform, Mutex::new(rx));
        }
        self
    }

    pub fn with_obs(mut self, rx: mpsc::Receiver<ObsCommand>) -> Self {
        self.obs = Some(Mutex::new(rx));
        self
    }

    /// Names of the feeds on offer, sorted.
    pub fn feeds(&self) -> Vec<String> {
        let mut feeds: Vec<String> = self.platforms.keys().map(|p| p.to_string()).collect();
        if self.obs.is_some() {
            feeds.push(OBS_FEED.to_string());
        }
        feeds.sort();
        feeds
    }

    /// Waits up to `wait` for platform commands. `None` when no feed exists.
    pub async fn poll_platform(
        &self,
        platform: Platform,
        wait: Duration,
    ) -> Option<Vec<PlatformCommand>> {
        let rx = self.platforms.get(&platform)?;
        let batch = drain(rx, wait).await;
        if !batch.is_empty() {
            debug!(%platform, commands = batch.len(), "handed commands to bridge");
        }
        Some(batch)
    }

    /// Waits up to `wait` for OBS commands. `None` when no feed exists.
    pub async fn poll_obs(&self, wait: Duration) -> Option<Vec<ObsDirective>> {
        let rx = self.obs.as_ref()?;
        let batch = drain(rx, wait).await;
        Some(batch.into_iter().map(ObsDirective::from).collect())
    }
}

/// One poller at a time per feed; later pollers wait for the lock.
async fn drain<T>(rx: &Mutex<mpsc::Receiver<T>>, wait: Duration) -> Vec<T> {
    let mut rx = rx.lock().await;
    let first = match tokio::time::timeout(wait.min(MAX_POLL_WAIT), rx.recv()).await {
        Ok(Some(first)) => first,
        Ok(None) | Err(_) => return Vec::new(),
    };
    let mut batch = vec![first];
    while batch.len() < MAX_BATCH {
        match rx.try_recv() {
            Ok(next) => batch.push(next),
            Err(_) => break,
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn poll_returns_queued_commands_in_order() {
        let (tx, rx) = mpsc::channel(8);
        let outbox = BridgeOutbox::new().with_platforms(HashMap::from([(Platform::Twitch, rx)]));
        for id in ["a", "b"] {
            tx.send(PlatformCommand::DeleteMessage {
                message_id: id.into(),
            })
            .await
            .unwrap();
        }
        let batch = outbox
            .poll_platform(Platform::Twitch, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(
            batch,
            vec![
                PlatformCommand::DeleteMessage {
                    message_id: "a".into()
                },
                PlatformCommand::DeleteMessage {
                    message_id: "b".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn missing_feed_is_none() {
        let outbox = BridgeOutbox::new();
        assert!(outbox.poll_platform(Platform::YouTube, Duration::ZERO).await.is_none());
        assert!(outbox.poll_obs(Duration::ZERO).await.is_none());
        assert!(outbox.feeds().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_poll_waits_then_returns_nothing() {
        let (_tx, rx) = mpsc::channel::<PlatformCommand>(8);
        let outbox = BridgeOutbox::new().with_platforms(HashMap::from([(Platform::Discord, rx)]));
        let start = tokio::time::Instant::now();
        let batch = outbox
            .poll_platform(Platform::Discord, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(batch.is_empty());
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_wakes_on_first_command() {
        let (tx, rx) = mpsc::channel(8);
        let outbox = BridgeOutbox::new().with_platforms(HashMap::from([(Platform::Twitch, rx)]));
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            tx.send(PlatformCommand::SetTitle {
                title: "Speedrun".into(),
            })
            .await
            .unwrap();
        });
        let start = tokio::time::Instant::now();
        let batch = outbox
            .poll_platform(Platform::Twitch, Duration::from_secs(20))
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn batches_are_capped() {
        let (tx, rx) = mpsc::channel(MAX_BATCH + 5);
        let outbox = BridgeOutbox::new().with_platforms(HashMap::from([(Platform::Twitch, rx)]));
        for i in 0..MAX_BATCH + 5 {
            tx.try_send(PlatformCommand::DeleteMessage {
                message_id: i.to_string(),
            })
            .unwrap();
        }
        let first = outbox.poll_platform(Platform::Twitch, Duration::ZERO).await.unwrap();
        let rest = outbox.poll_platform(Platform::Twitch, Duration::ZERO).await.unwrap();
        assert_eq!(first.len(), MAX_BATCH);
        assert_eq!(rest.len(), 5);
    }

    #[tokio::test]
    async fn obs_commands_are_acknowledged_on_handover() {
        let (tx, rx) = mpsc::channel(4);
        let outbox = BridgeOutbox::new().with_obs(rx);
        let (reply, acked) = oneshot::channel();
        tx.send(ObsCommand::SwitchScene {
            scene: "Gaming".into(),
            reply: Some(reply),
        })
        .await
        .unwrap();

        let batch = outbox.poll_obs(Duration::ZERO).await.unwrap();
        assert_eq!(
            batch,
            vec![ObsDirective::SwitchScene {
                scene: "Gaming".into()
            }]
        );
        assert!(acked.await.unwrap().is_ok());
        assert_eq!(outbox.feeds(), vec!["obs"]);
    }
}
