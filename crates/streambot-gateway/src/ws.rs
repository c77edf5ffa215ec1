// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket connections from overlay and control-panel clients.
//!
//! Both directions carry `{"call": name, "args": [...]}` text frames. The
//! server pings every [`PING_PERIOD`]; a connection that sends nothing for
//! [`PONG_WAIT`] is closed.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use streambot_core::{Broadcaster, CallEnvelope};
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use crate::commands::Session;
use crate::server::GatewayState;

pub const PONG_WAIT: Duration = Duration::from_secs(60);
pub const PING_PERIOD: Duration = Duration::from_secs(54);

/// Upgrades the connection; the admin flag is fixed here for its lifetime.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    State(state): State<GatewayState>,
) -> Response {
    let admin = state.admin.is_admin(peer.ip(), &headers);
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, admin))
}

async fn handle_socket(socket: WebSocket, state: GatewayState, admin: bool) {
    let (mut sink, mut stream) = socket.split();
    let (client, mut outbound) = state.hub.register();
    let session = Session { client, admin };
    info!(%client, admin, "web client connected");

    let mut writer = tokio::spawn(async move {
        let mut ping = interval_at(Instant::now() + PING_PERIOD, PING_PERIOD);
        loop {
            tokio::select! {
                next = outbound.recv() => {
                    let Some(text) = next else {
                        // Dropped by the hub.
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // The aggregator replays history and then admits the client.
    if let Err(e) = state.bus.client_connected(client).await {
        warn!(%client, error = %e, "could not request history replay");
        state.hub.admit(client);
    }

    loop {
        let read = tokio::select! {
            read = tokio::time::timeout(PONG_WAIT, stream.next()) => read,
            _ = &mut writer => {
                debug!(%client, "writer finished");
                break;
            }
        };
        let msg = match read {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(e))) => {
                debug!(%client, error = %e, "websocket read failed");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                info!(%client, "client silent past deadline, disconnecting");
                break;
            }
        };
        match msg {
            Message::Text(text) => {
                let text_str: &str = &text;
                match serde_json::from_str::<CallEnvelope>(text_str) {
                    Ok(envelope) => state.commands.handle(session, envelope).await,
                    Err(e) => warn!(%client, error = %e, "invalid client message"),
                }
            }
            Message::Close(_) => break,
            // Pongs only refresh the deadline.
            _ => {}
        }
    }

    state.hub.unregister(client);
    state.registry.unbind_client(client);
    writer.abort();
    info!(%client, "web client disconnected");
}
