// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcaster that records every call.

use std::collections::HashSet;
use std::sync::Mutex;

use serde_json::Value;
use streambot_core::{Broadcaster, ClientId};

/// One captured call; `client` is `None` for broadcasts.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub client: Option<ClientId>,
    pub call: String,
    pub args: Vec<Value>,
}

#[derive(Default)]
pub struct RecordingBroadcaster {
    calls: Mutex<Vec<RecordedCall>>,
    gone: Mutex<HashSet<ClientId>>,
    admitted: Mutex<Vec<ClientId>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `send_to(client, ..)` report the client as gone.
    pub fn disconnect(&self, client: ClientId) {
        if let Ok(mut gone) = self.gone.lock() {
            gone.insert(client);
        }
    }

    /// Clients admitted to broadcasts, in order.
    pub fn admitted(&self) -> Vec<ClientId> {
        self.admitted.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Calls with the given name, in order.
    pub fn named(&self, call: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.call == call)
            .collect()
    }

    /// Calls delivered to one client, including nothing from broadcasts.
    pub fn sent_to(&self, client: ClientId) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.client == Some(client))
            .collect()
    }

    fn record(&self, client: Option<ClientId>, call: &str, args: Vec<Value>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                client,
                call: call.to_string(),
                args,
            });
        }
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast(&self, call: &str, args: Vec<Value>) {
        self.record(None, call, args);
    }

    fn send_to(&self, client: ClientId, call: &str, args: Vec<Value>) -> bool {
        let gone = self.gone.lock().map(|g| g.contains(&client)).unwrap_or(false);
        if gone {
            return false;
        }
        self.record(Some(client), call, args);
        true
    }

    fn admit(&self, client: ClientId) {
        if let Ok(mut admitted) = self.admitted.lock() {
            admitted.push(client);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_broadcasts_and_direct_sends() {
        let rec = RecordingBroadcaster::new();
        rec.broadcast("Reload", vec![]);
        assert!(rec.send_to(ClientId(1), "Welcome", vec![Value::Null]));
        rec.disconnect(ClientId(2));
        assert!(!rec.send_to(ClientId(2), "Welcome", vec![]));

        assert_eq!(rec.calls().len(), 2);
        assert_eq!(rec.named("Reload")[0].client, None);
        assert_eq!(rec.sent_to(ClientId(1)).len(), 1);

        rec.admit(ClientId(1));
        assert_eq!(rec.admitted(), vec![ClientId(1)]);
        assert_eq!(rec.calls().len(), 2);
    }
}
