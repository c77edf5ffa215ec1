// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out to connected web clients.

use serde_json::Value;

/// Identifier of one connected web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Sends `{"call": name, "args": [...]}` envelopes to web clients.
///
/// Sends are non-blocking; a client whose buffer is full is dropped. A new
/// client receives only direct sends until it is admitted, so that its
/// history replay cannot interleave with live broadcasts.
pub trait Broadcaster: Send + Sync + 'static {
    /// Sends to every connected client.
    fn broadcast(&self, call: &str, args: Vec<Value>);

    /// Sends to one client. Returns `false` if the client is gone or was
    /// dropped because its buffer was full.
    fn send_to(&self, client: ClientId, call: &str, args: Vec<Value>) -> bool;

    /// Starts delivering broadcasts to `client`.
    fn admit(&self, client: ClientId);
}
