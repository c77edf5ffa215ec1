// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock platform adapter.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use streambot_core::traits::{PlatformAdapter, PluginAdapter};
use streambot_core::{HealthStatus, InboundChat, Platform, PlatformCommand, StreambotError};

/// A mock platform connection.
///
/// Clones share state, so a test keeps one clone while the connector owns
/// the other. Inbound chat injected with [`inject`](Self::inject) is
/// returned by `receive`; executed commands are captured.
#[derive(Clone)]
pub struct MockPlatform {
    platform: Platform,
    inbound: Arc<Mutex<VecDeque<Option<InboundChat>>>>,
    notify: Arc<Notify>,
    executed: Arc<Mutex<Vec<PlatformCommand>>>,
    connect_failures: Arc<AtomicUsize>,
    connects: Arc<AtomicUsize>,
    execute_failures: Arc<AtomicUsize>,
}

impl MockPlatform {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            executed: Arc::new(Mutex::new(Vec::new())),
            connect_failures: Arc::new(AtomicUsize::new(0)),
            connects: Arc::new(AtomicUsize::new(0)),
            execute_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes the next `n` connect attempts fail.
    pub fn fail_connects(&self, n: usize) {
        self.connect_failures.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` executed commands fail.
    pub fn fail_executes(&self, n: usize) {
        self.execute_failures.store(n, Ordering::SeqCst);
    }

    /// Successful connects so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub async fn inject(&self, chat: InboundChat) {
        self.inbound.lock().await.push_back(Some(chat));
        self.notify.notify_one();
    }

    /// Makes `receive` report end of stream once the queue drains to here.
    pub async fn disconnect(&self) {
        self.inbound.lock().await.push_back(None);
        self.notify.notify_one();
    }

    pub async fn executed(&self) -> Vec<PlatformCommand> {
        self.executed.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockPlatform {
    fn name(&self) -> &str {
        "mock-platform"
    }

    async fn health_check(&self) -> Result<HealthStatus, StreambotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl PlatformAdapter for MockPlatform {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn connect(&mut self) -> Result<(), StreambotError> {
        let remaining = self.connect_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.connect_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StreambotError::platform("mock connect failure"));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn receive(&self) -> Result<Option<InboundChat>, StreambotError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(item) = queue.pop_front() {
                    return Ok(item);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn execute(&self, command: PlatformCommand) -> Result<(), StreambotError> {
        let remaining = self.execute_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.execute_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StreambotError::platform("mock execute failure"));
        }
        self.executed.lock().await.push(command);
        Ok(())
    }
}
