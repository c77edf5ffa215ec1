// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named bounded queues with an explicit overflow policy.

use streambot_core::StreambotError;
use tokio::sync::mpsc;
use tracing::warn;

/// Result of a non-blocking send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Accepted,
    /// The queue was full (or its consumer is gone) and the item was discarded.
    Dropped,
}

impl SendOutcome {
    pub fn is_accepted(self) -> bool {
        self == SendOutcome::Accepted
    }
}

/// Producer handle for one bounded queue.
///
/// [`try_send`](Self::try_send) never blocks and drops the newest item when
/// full; [`send`](Self::send) waits for room and is only used where
/// back-pressure on the producer is acceptable.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    name: &'static str,
    capacity: usize,
    tx: mpsc::Sender<T>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            capacity: self.capacity,
            tx: self.tx.clone(),
        }
    }
}

impl<T> BoundedQueue<T> {
    /// Creates a queue and returns its single consumer end.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; configuration validation rejects that.
    pub fn new(name: &'static str, capacity: usize) -> (Self, mpsc::Receiver<T>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { name, capacity, tx }, rx)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items currently queued.
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueues without waiting; a full queue drops `msg` and logs it.
    pub fn try_send(&self, msg: T) -> SendOutcome {
        match self.tx.try_send(msg) {
            Ok(()) => SendOutcome::Accepted,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(queue = self.name, capacity = self.capacity, "queue full, dropping message");
                metrics::counter!("streambot_queue_dropped_total", "queue" => self.name)
                    .increment(1);
                SendOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(queue = self.name, "queue consumer gone, dropping message");
                metrics::counter!("streambot_queue_dropped_total", "queue" => self.name)
                    .increment(1);
                SendOutcome::Dropped
            }
        }
    }

    /// Enqueues, waiting for room.
    pub async fn send(&self, msg: T) -> Result<(), StreambotError> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| StreambotError::QueueClosed {
                queue: self.name.to_string(),
            })
    }
}
