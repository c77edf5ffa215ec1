// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-platform connector loop.
//!
//! Connects the adapter, forwards inbound chat to the aggregator in arrival
//! order and executes commands from the platform's queue. Any failure ends
//! the session and the loop reconnects under [`Backoff`].

use streambot_bus::MessageBus;
use streambot_core::{ChatEntry, PlatformAdapter, PlatformCommand, PluginAdapter};
use streambot_resilience::Backoff;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::render::render_inbound;

pub struct PlatformConnector {
    adapter: Box<dyn PlatformAdapter>,
    bus: MessageBus,
    commands: mpsc::Receiver<PlatformCommand>,
    commands_open: bool,
}

impl PlatformConnector {
    pub fn new(
        adapter: Box<dyn PlatformAdapter>,
        bus: MessageBus,
        commands: mpsc::Receiver<PlatformCommand>,
    ) -> Self {
        Self {
            adapter,
            bus,
            commands,
            commands_open: true,
        }
    }

    /// Runs for the life of the process.
    pub async fn run(mut self) {
        let platform = self.adapter.platform();
        let mut backoff = Backoff::new(format!("{platform} connection"));
        loop {
            backoff.attempt().await;
            if let Err(e) = self.adapter.connect().await {
                warn!(%platform, error = %e, attempts = backoff.attempts(), "connect failed");
                continue;
            }
            info!(%platform, adapter = self.adapter.name(), "connected");
            self.session(&mut backoff).await;
        }
    }

    /// One connected session. Returns when the upstream stream ends or fails.
    async fn session(&mut self, backoff: &mut Backoff) {
        let platform = self.adapter.platform();
        let mut confirmed = false;
        loop {
            tokio::select! {
                received = self.adapter.receive() => match received {
                    Ok(Some(chat)) => {
                        if !confirmed {
                            backoff.success();
                            confirmed = true;
                        }
                        let entry = render_inbound(&chat);
                        if let Err(e) = self.bus.enqueue_chat(entry).await {
                            warn!(%platform, error = %e, "aggregator unavailable, chat dropped");
                        }
                    }
                    Ok(None) => {
                        warn!(%platform, "stream ended, reconnecting");
                        return;
                    }
                    Err(e) => {
                        warn!(%platform, error = %e, "receive failed, reconnecting");
                        return;
                    }
                },
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(command) => self.execute(command).await,
                    None => self.commands_open = false,
                },
            }
        }
    }

    async fn execute(&self, command: PlatformCommand) {
        let platform = self.adapter.platform();
        let announcement = match &command {
            PlatformCommand::Ban { user, .. } => Some(ChatEntry::system(
                format!("💀 {}", user.render_html()),
                format!("banned {}", user.display_name()),
            )),
            _ => None,
        };
        match self.adapter.execute(command).await {
            Ok(()) => {
                if let Some(entry) = announcement {
                    if let Err(e) = self.bus.enqueue_chat(entry).await {
                        warn!(%platform, error = %e, "could not announce ban");
                    }
                }
            }
            Err(e) => warn!(%platform, error = %e, "command failed"),
        }
    }
}
