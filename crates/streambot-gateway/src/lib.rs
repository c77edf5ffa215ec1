// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the streambot overlay.
//!
//! [`WebsocketHub`] is the process-wide [`streambot_core::Broadcaster`]:
//! the aggregator and TTS pipeline publish through it, and each websocket
//! connection drains its own bounded buffer. Client commands are decoded
//! and executed by [`CommandHandler`]. Commands without an in-process
//! consumer wait in the [`BridgeOutbox`] for an external bridge.

pub mod auth;
pub mod bridge;
pub mod commands;
pub mod hub;
pub mod reload;
pub mod server;
pub mod ws;

pub use auth::{AdminPolicy, AuthConfig};
pub use bridge::{BridgeOutbox, ObsDirective};
pub use commands::{Command, CommandHandler, CommandName, Session};
pub use hub::WebsocketHub;
pub use reload::watch_static;
pub use server::{GatewayState, router, serve, start_server};
