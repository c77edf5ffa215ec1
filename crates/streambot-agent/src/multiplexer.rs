// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Starts one [`PlatformConnector`] per registered platform adapter.
//!
//! Each connector takes the command receiver for its platform. Receivers
//! of platforms without an adapter are handed back to the caller, which
//! either offers them to an external bridge or drops them so commands
//! addressed to those platforms fail fast.

use std::collections::HashMap;

use streambot_bus::MessageBus;
use streambot_core::{Platform, PlatformAdapter, PlatformCommand};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::connector::PlatformConnector;

/// Running connectors and the command receivers nobody claimed.
pub struct PlatformTasks {
    pub handles: Vec<JoinHandle<()>>,
    pub unclaimed: HashMap<Platform, mpsc::Receiver<PlatformCommand>>,
}

#[derive(Default)]
pub struct PlatformMultiplexer {
    adapters: Vec<Box<dyn PlatformAdapter>>,
}

impl PlatformMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter. A second adapter for the same platform is
    /// ignored at spawn time.
    pub fn add(&mut self, adapter: Box<dyn PlatformAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Spawns the connectors, consuming the platform command receivers.
    pub fn spawn(
        self,
        bus: &MessageBus,
        mut receivers: HashMap<Platform, mpsc::Receiver<PlatformCommand>>,
    ) -> PlatformTasks {
        let mut handles = Vec::new();
        for adapter in self.adapters {
            let platform = adapter.platform();
            let Some(commands) = receivers.remove(&platform) else {
                warn!(%platform, "duplicate adapter ignored");
                continue;
            };
            info!(%platform, "starting platform connector");
            let connector = PlatformConnector::new(adapter, bus.clone(), commands);
            handles.push(tokio::spawn(connector.run()));
        }
        for platform in receivers.keys() {
            info!(%platform, "no adapter configured");
        }
        PlatformTasks {
            handles,
            unclaimed: receivers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streambot_config::model::BusConfig;
    use streambot_core::StreambotError;
    use streambot_test_utils::MockPlatform;

    #[tokio::test]
    async fn unconfigured_platforms_reject_commands() {
        let (bus, rx) = MessageBus::new(&BusConfig::default());
        let mut mux = PlatformMultiplexer::new();
        mux.add(Box::new(MockPlatform::new(Platform::Twitch)));
        mux.add(Box::new(MockPlatform::new(Platform::Twitch)));
        assert_eq!(mux.len(), 2);

        let tasks = mux.spawn(&bus, rx.platforms);
        assert_eq!(tasks.handles.len(), 1);
        let mut unclaimed: Vec<_> = tasks.unclaimed.keys().copied().collect();
        unclaimed.sort_by_key(|p| p.to_string());
        assert_eq!(unclaimed, vec![Platform::Discord, Platform::YouTube]);
        drop(tasks.unclaimed);

        let err = bus
            .platform_command(
                Platform::YouTube,
                PlatformCommand::SetTitle { title: "x".into() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StreambotError::QueueClosed { .. }));

        bus.platform_command(
            Platform::Twitch,
            PlatformCommand::SetTitle { title: "x".into() },
        )
        .await
        .unwrap();

        for handle in tasks.handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn unclaimed_receivers_stay_open_while_held() {
        let (bus, rx) = MessageBus::new(&BusConfig::default());
        let mut tasks = PlatformMultiplexer::new().spawn(&bus, rx.platforms);
        assert!(tasks.handles.is_empty());

        bus.platform_command(
            Platform::Discord,
            PlatformCommand::SetTitle { title: "x".into() },
        )
        .await
        .unwrap();
        let discord = tasks.unclaimed.get_mut(&Platform::Discord).unwrap();
        assert_eq!(
            discord.recv().await,
            Some(PlatformCommand::SetTitle { title: "x".into() })
        );
    }
}
