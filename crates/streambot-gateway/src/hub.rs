// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of connected web clients and fan-out to them.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;
use streambot_core::{Broadcaster, CallEnvelope, ClientId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct ClientSlot {
    tx: mpsc::Sender<String>,
    admitted: bool,
}

/// Per-client outbound buffers keyed by [`ClientId`].
///
/// Sends never wait. A client whose buffer is full (or whose connection
/// task is gone) is removed; dropping its sender ends the connection.
/// Registered clients skip broadcasts until [`Broadcaster::admit`].
pub struct WebsocketHub {
    clients: DashMap<ClientId, ClientSlot>,
    next_id: AtomicU64,
    buffer: usize,
}

impl WebsocketHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            clients: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Adds a client and returns its id and the outbound message stream.
    pub fn register(&self) -> (ClientId, mpsc::Receiver<String>) {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.buffer);
        self.clients.insert(
            id,
            ClientSlot {
                tx,
                admitted: false,
            },
        );
        debug!(client = %id, total = self.clients.len(), "client registered");
        (id, rx)
    }

    pub fn unregister(&self, client: ClientId) {
        if self.clients.remove(&client).is_some() {
            debug!(%client, total = self.clients.len(), "client unregistered");
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.clients.contains_key(&client)
    }

    pub fn is_admitted(&self, client: ClientId) -> bool {
        self.clients.get(&client).is_some_and(|slot| slot.admitted)
    }

    fn drop_client(&self, client: ClientId) {
        if self.clients.remove(&client).is_some() {
            warn!(%client, "client buffer full, disconnecting");
            metrics::counter!("streambot_ws_clients_dropped_total").increment(1);
        }
    }
}

fn encode(call: &str, args: Vec<Value>) -> Option<String> {
    match serde_json::to_string(&CallEnvelope::new(call, args)) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(call, error = %e, "failed to encode call");
            None
        }
    }
}

impl Broadcaster for WebsocketHub {
    fn broadcast(&self, call: &str, args: Vec<Value>) {
        let Some(json) = encode(call, args) else {
            return;
        };
        // Collected first: removing while iterating a DashMap deadlocks.
        let stalled: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|entry| entry.admitted && entry.tx.try_send(json.clone()).is_err())
            .map(|entry| *entry.key())
            .collect();
        for client in stalled {
            self.drop_client(client);
        }
    }

    fn send_to(&self, client: ClientId, call: &str, args: Vec<Value>) -> bool {
        let Some(json) = encode(call, args) else {
            return self.contains(client);
        };
        let delivered = match self.clients.get(&client) {
            Some(slot) => slot.tx.try_send(json).is_ok(),
            None => return false,
        };
        if !delivered {
            self.drop_client(client);
        }
        delivered
    }

    fn admit(&self, client: ClientId) {
        if let Some(mut slot) = self.clients.get_mut(&client) {
            slot.admitted = true;
            debug!(%client, "client admitted to broadcasts");
        }
    }
}
