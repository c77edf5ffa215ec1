// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Websocket round trips against a live gateway.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use streambot_agent::IdentityRegistry;
use streambot_bus::{AggregatorMessage, BusReceivers, MessageBus};
use streambot_config::model::{BusConfig, GatewayConfig};
use streambot_core::{Broadcaster, ClientId};
use streambot_gateway::{GatewayState, WebsocketHub, router, serve};
use streambot_storage::MutedSet;
use streambot_test_utils::twitch_user;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Gateway {
    url: String,
    hub: Arc<WebsocketHub>,
    muted: Arc<MutedSet>,
    rx: BusReceivers,
    _dir: tempfile::TempDir,
}

async fn start() -> Gateway {
    let dir = tempfile::tempdir().unwrap();
    let config = GatewayConfig {
        static_dir: dir.path().to_path_buf(),
        ..GatewayConfig::default()
    };
    let (bus, rx) = MessageBus::new(&BusConfig::default());
    let hub = Arc::new(WebsocketHub::new(16));
    let muted = Arc::new(MutedSet::empty(dir.path().join("muted.txt")));
    let state = GatewayState::new(
        &config,
        hub.clone(),
        bus,
        Arc::new(IdentityRegistry::in_memory()),
        muted.clone(),
        None,
    )
    .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, router(state, &config)));
    Gateway {
        url: format!("ws://{addr}/ws"),
        hub,
        muted,
        rx,
        _dir: dir,
    }
}

async fn next_connected(rx: &mut BusReceivers) -> ClientId {
    let msg = tokio::time::timeout(Duration::from_secs(5), rx.aggregator.recv())
        .await
        .unwrap();
    match msg {
        Some(AggregatorMessage::ClientConnected(client)) => client,
        other => panic!("expected ClientConnected, got {other:?}"),
    }
}

async fn next_call(socket: &mut Socket) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn call(socket: &mut Socket, name: &str, args: Vec<Value>) {
    let text = json!({"call": name, "args": args}).to_string();
    socket.send(Message::text(text)).await.unwrap();
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn connect_requests_replay_then_admitted_client_receives_broadcasts() {
    let mut gw = start().await;
    let (mut socket, _) = connect_async(gw.url.as_str()).await.unwrap();
    let client = next_connected(&mut gw.rx).await;
    assert!(gw.hub.contains(client));
    assert!(!gw.hub.is_admitted(client));
    gw.hub.admit(client);

    gw.hub.send_to(client, "SetStreamTitle", vec![json!("Speedrun")]);
    gw.hub.broadcast("OnChatMessage", vec![json!({"html": "hi"})]);

    assert_eq!(
        next_call(&mut socket).await,
        json!({"call": "SetStreamTitle", "args": ["Speedrun"]})
    );
    assert_eq!(next_call(&mut socket).await["call"], "OnChatMessage");
}

#[tokio::test]
async fn local_client_is_admin() {
    let mut gw = start().await;
    let (mut socket, _) = connect_async(gw.url.as_str()).await.unwrap();
    next_connected(&mut gw.rx).await;

    let alice = twitch_user("1", "Alice");
    call(&mut socket, "ToggleMuted", vec![serde_json::to_value(&alice).unwrap()]).await;
    let muted = gw.muted.clone();
    wait_for(|| muted.is_muted(&alice)).await;

    // The announcement reaches the aggregator queue.
    let msg = tokio::time::timeout(Duration::from_secs(5), gw.rx.aggregator.recv())
        .await
        .unwrap();
    assert!(matches!(msg, Some(AggregatorMessage::Chat(_))));
}

#[tokio::test]
async fn proxied_outsider_cannot_mutate() {
    let mut gw = start().await;
    let mut request = gw.url.as_str().into_client_request().unwrap();
    request
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
    let (mut socket, _) = connect_async(request).await.unwrap();
    let client = next_connected(&mut gw.rx).await;

    let alice = twitch_user("1", "Alice");
    call(&mut socket, "ToggleMuted", vec![serde_json::to_value(&alice).unwrap()]).await;
    // Non-admin commands still work and prove the mute was processed first.
    call(&mut socket, "ListVoices", vec![]).await;
    assert_eq!(next_call(&mut socket).await["call"], "ListVoicesResponse");
    assert!(!gw.muted.is_muted(&alice));
    assert!(gw.hub.contains(client));
}

#[tokio::test]
async fn password_login_welcomes_client() {
    let mut gw = start().await;
    let (mut socket, _) = connect_async(gw.url.as_str()).await.unwrap();
    next_connected(&mut gw.rx).await;

    call(&mut socket, "Password", vec![json!("hunter2")]).await;
    let welcome = next_call(&mut socket).await;
    assert_eq!(welcome["call"], "Welcome");
    assert!(!welcome["args"][0]["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn closing_unregisters_client() {
    let mut gw = start().await;
    let (mut socket, _) = connect_async(gw.url.as_str()).await.unwrap();
    let client = next_connected(&mut gw.rx).await;
    socket.close(None).await.unwrap();

    let hub = gw.hub.clone();
    wait_for(|| !hub.contains(client)).await;
    assert!(gw.hub.is_empty());
}
