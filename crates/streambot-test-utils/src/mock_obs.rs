// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock OBS controller fed with scripted events.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use streambot_core::traits::obs::{InputLevels, ObsEvent};
use streambot_core::traits::{ObsController, PluginAdapter};
use streambot_core::{HealthStatus, StreambotError};

#[derive(Clone)]
pub struct MockObs {
    scene: Arc<Mutex<String>>,
    events: Arc<Mutex<VecDeque<Option<ObsEvent>>>>,
    notify: Arc<Notify>,
    switches: Arc<Mutex<Vec<String>>>,
}

impl MockObs {
    pub fn new(initial_scene: &str) -> Self {
        Self {
            scene: Arc::new(Mutex::new(initial_scene.to_string())),
            events: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            switches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn push(&self, event: ObsEvent) {
        self.events.lock().await.push_back(Some(event));
        self.notify.notify_one();
    }

    /// Pushes a meter snapshot with one input at `peak` linear level.
    pub async fn push_level(&self, input: &str, peak: f64) {
        self.push(ObsEvent::VolumeMeters(vec![InputLevels {
            name: input.to_string(),
            levels: vec![[peak, peak, peak]],
        }]))
        .await;
    }

    /// Ends the event stream once the queue drains to here.
    pub async fn close(&self) {
        self.events.lock().await.push_back(None);
        self.notify.notify_one();
    }

    pub async fn switches(&self) -> Vec<String> {
        self.switches.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockObs {
    fn name(&self) -> &str {
        "mock-obs"
    }

    async fn health_check(&self) -> Result<HealthStatus, StreambotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ObsController for MockObs {
    async fn connect(&mut self) -> Result<String, StreambotError> {
        Ok(self.scene.lock().await.clone())
    }

    async fn next_event(&self) -> Result<Option<ObsEvent>, StreambotError> {
        loop {
            if let Some(event) = self.events.lock().await.pop_front() {
                return Ok(event);
            }
            self.notify.notified().await;
        }
    }

    async fn switch_scene(&self, scene: &str) -> Result<(), StreambotError> {
        *self.scene.lock().await = scene.to_string();
        self.switches.lock().await.push(scene.to_string());
        Ok(())
    }
}
