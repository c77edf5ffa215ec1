// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History replay through the real hub and aggregator.

use std::sync::Arc;

use serde_json::Value;
use streambot_agent::{Aggregator, IdentityRegistry};
use streambot_bus::{AggregatorMessage, MessageBus};
use streambot_config::model::{AgentConfig, BusConfig};
use streambot_core::{Broadcaster, ChatEntry};
use streambot_gateway::WebsocketHub;
use streambot_test_utils::twitch_user;
use tokio::sync::mpsc;

fn chat(text: &str) -> ChatEntry {
    ChatEntry::new(twitch_user("1", "Alice"), text).with_html(format!("<p>{text}</p>"))
}

fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(text) = rx.try_recv() {
        frames.push(serde_json::from_str(&text).unwrap());
    }
    frames
}

fn chat_texts(frames: &[Value]) -> Vec<String> {
    frames
        .iter()
        .filter(|f| f["call"] == "OnChatMessage")
        .map(|f| f["args"][0]["original_message"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn chat_between_connect_and_replay_is_delivered_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = AgentConfig {
        data_dir: dir.path().to_path_buf(),
        ..AgentConfig::default()
    };
    let (bus, _rx) = MessageBus::new(&BusConfig::default());
    let hub = Arc::new(WebsocketHub::new(64));
    let mut aggregator = Aggregator::new(
        &config,
        bus,
        hub.clone(),
        Arc::new(IdentityRegistry::in_memory()),
    );

    let (client, mut outbound) = hub.register();
    aggregator.handle(AggregatorMessage::Chat(chat("hello"))).await;
    aggregator
        .handle(AggregatorMessage::ClientConnected(client))
        .await;
    aggregator.handle(AggregatorMessage::Chat(chat("after"))).await;

    let frames = drain(&mut outbound);
    let calls: Vec<_> = frames.iter().map(|f| f["call"].as_str().unwrap()).collect();
    assert_eq!(
        calls,
        vec!["SetAudioMessage", "SetStreamTitle", "OnChatMessage", "OnChatMessage"]
    );
    assert_eq!(chat_texts(&frames), vec!["hello", "after"]);
    assert!(hub.is_admitted(client));
}

#[tokio::test]
async fn admitted_clients_are_unaffected_by_a_new_join() {
    let dir = tempfile::tempdir().unwrap();
    let config = AgentConfig {
        data_dir: dir.path().to_path_buf(),
        ..AgentConfig::default()
    };
    let (bus, _rx) = MessageBus::new(&BusConfig::default());
    let hub = Arc::new(WebsocketHub::new(64));
    let mut aggregator = Aggregator::new(
        &config,
        bus,
        hub.clone(),
        Arc::new(IdentityRegistry::in_memory()),
    );

    let (old, mut old_rx) = hub.register();
    hub.admit(old);
    let (_new, mut new_rx) = hub.register();
    aggregator.handle(AggregatorMessage::Chat(chat("live"))).await;

    assert_eq!(chat_texts(&drain(&mut old_rx)), vec!["live"]);
    assert!(drain(&mut new_rx).is_empty());
}
