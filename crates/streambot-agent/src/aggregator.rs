// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat aggregator.
//!
//! One task owns the chat ring, the persisted log and the sequence counter.
//! Everything that touches them arrives through the aggregator queue, so
//! ingestion, replay to new clients and title updates are serialized.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use streambot_bus::{AggregatorMessage, MessageBus, SendOutcome};
use streambot_config::model::AgentConfig;
use streambot_core::{Broadcaster, ChatEntry, ClientId, PlatformCommand};
use streambot_storage::{ChatLog, SequenceCounter};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::filter::ContentFilter;
use crate::identity::IdentityRegistry;

/// Target used for the terminal chat echo.
pub const CHAT_TARGET: &str = "streambot::chat";

/// Owner of chat history, persistence and fan-out.
pub struct Aggregator {
    ring: VecDeque<ChatEntry>,
    capacity: usize,
    log: ChatLog,
    counter: SequenceCounter,
    broadcaster: Arc<dyn Broadcaster>,
    bus: MessageBus,
    registry: Arc<IdentityRegistry>,
    filter: Option<Arc<dyn ContentFilter>>,
    login_command: String,
    audio_message: String,
    title: String,
}

impl Aggregator {
    pub fn new(
        config: &AgentConfig,
        bus: MessageBus,
        broadcaster: Arc<dyn Broadcaster>,
        registry: Arc<IdentityRegistry>,
    ) -> Self {
        let capacity = config.chat_history.max(1);
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity,
            log: ChatLog::in_dir(&config.data_dir),
            counter: SequenceCounter::in_dir(&config.data_dir),
            broadcaster,
            bus,
            registry,
            filter: None,
            login_command: config.login_command.clone(),
            audio_message: String::new(),
            title: String::new(),
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn ContentFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Seeds the ring from the tail of the persisted log.
    pub async fn load_history(&mut self) {
        match self.log.read_last(self.capacity).await {
            Ok(entries) => {
                info!(entries = entries.len(), "restored chat history");
                self.ring = entries.into();
            }
            Err(e) => warn!(error = %e, "could not read chat log, starting empty"),
        }
    }

    /// Entries currently held for replay, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ChatEntry> {
        self.ring.iter()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn audio_message(&self) -> &str {
        &self.audio_message
    }

    /// Drains the aggregator queue until every producer is gone.
    pub async fn run(mut self, mut rx: mpsc::Receiver<AggregatorMessage>) {
        info!(component = "aggregator", "aggregator started");
        while let Some(msg) = rx.recv().await {
            self.handle(msg).await;
        }
        info!(component = "aggregator", "aggregator stopped");
    }

    pub async fn handle(&mut self, msg: AggregatorMessage) {
        match msg {
            AggregatorMessage::Chat(entry) => self.ingest(entry).await,
            AggregatorMessage::AudioMessage(text) => {
                self.broadcaster
                    .broadcast("SetAudioMessage", vec![Value::String(text.clone())]);
                self.audio_message = text;
            }
            AggregatorMessage::StreamTitle(title) => {
                self.broadcaster
                    .broadcast("SetStreamTitle", vec![Value::String(title.clone())]);
                self.title = title;
            }
            AggregatorMessage::ClientConnected(client) => self.replay(client),
        }
    }

    /// Runs one entry through interception, filtering, persistence and
    /// fan-out.
    pub async fn ingest(&mut self, mut entry: ChatEntry) {
        if self.intercept_login(&entry).await {
            return;
        }
        if let Some(reason) = self.filter.as_ref().and_then(|f| f.check(&entry)) {
            info!(author = %entry.author.key(), %reason, "suppressed chat message");
            self.delete_upstream(&entry);
            return;
        }

        if !entry.terminal_text.is_empty() {
            info!(target: CHAT_TARGET, "{}", entry.terminal_text);
        }

        match self.counter.next().await {
            Ok(id) => entry.sequence_id = Some(id),
            Err(e) => warn!(error = %e, "sequence counter unavailable, message has no id"),
        }

        if self.ring.len() >= self.capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(entry.clone());

        if let Err(e) = self.log.append(&entry).await {
            warn!(error = %e, "failed to append to chat log");
        }

        match serde_json::to_value(&entry) {
            Ok(json) => self.broadcaster.broadcast("OnChatMessage", vec![json]),
            Err(e) => warn!(error = %e, "failed to serialize chat entry"),
        }

        if !entry.tts_text.is_empty() && self.bus.enqueue_tts(entry) == SendOutcome::Dropped {
            warn!("TTS busy, dropping message");
        }
    }

    /// Handles `<login_command> <ticket>`. Returns `true` when the entry was
    /// consumed.
    async fn intercept_login(&self, entry: &ChatEntry) -> bool {
        if entry.author.platform().is_none() {
            return false;
        }
        let mut words = entry.original_message.split_whitespace();
        if words.next() != Some(self.login_command.as_str()) {
            return false;
        }
        let Some(ticket) = words.next() else {
            return false;
        };

        self.delete_upstream(entry);

        let Some(account) = self.registry.redeem_ticket(ticket, &entry.author) else {
            info!(author = %entry.author.key(), "login with unknown ticket");
            return true;
        };
        info!(account = %account.id, author = %entry.author.key(), "linked platform identity");

        match serde_json::to_value(&account) {
            Ok(json) => {
                for client in self.registry.clients_of(&account.id) {
                    self.broadcaster.send_to(client, "Welcome", vec![json.clone()]);
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize account"),
        }
        if let Err(e) = self.registry.save().await {
            warn!(error = %e, "failed to save accounts");
        }
        true
    }

    fn delete_upstream(&self, entry: &ChatEntry) {
        let Some(id) = &entry.platform_message_id else {
            return;
        };
        let command = PlatformCommand::DeleteMessage {
            message_id: id.id.clone(),
        };
        if self.bus.try_platform_command(id.platform, command) == SendOutcome::Dropped {
            warn!(platform = %id.platform, "could not queue upstream delete");
        }
    }

    /// Sends the current state to a new client, then admits it to live
    /// broadcasts. Entries ingested before this point reach it only here.
    fn replay(&self, client: ClientId) {
        debug!(%client, entries = self.ring.len(), "replaying state to client");
        let audio = Value::String(self.audio_message.clone());
        if !self.broadcaster.send_to(client, "SetAudioMessage", vec![audio]) {
            return;
        }
        let title = Value::String(self.title.clone());
        if !self.broadcaster.send_to(client, "SetStreamTitle", vec![title]) {
            return;
        }
        for entry in &self.ring {
            let Ok(json) = serde_json::to_value(entry) else {
                continue;
            };
            if !self.broadcaster.send_to(client, "OnChatMessage", vec![json]) {
                return;
            }
        }
        self.broadcaster.admit(client);
    }
}
