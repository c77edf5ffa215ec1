// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock synthesis backend and remote launcher.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use streambot_core::traits::launcher::ProcessHandle;
use streambot_core::traits::{PluginAdapter, RemoteLauncher, SynthesisBackend, SynthesisRequest};
use streambot_core::{HealthStatus, StreambotError, WavClip};

use crate::wav_clip;

#[derive(Default)]
struct SynthState {
    requests: Mutex<Vec<SynthesisRequest>>,
    voices: Mutex<Vec<String>>,
    failing_texts: Mutex<Vec<String>>,
    health_checks: AtomicUsize,
}

/// A synthesis backend that returns short silent clips.
///
/// Clones share state. The backend is up unless created with
/// [`MockSynthesizer::down`]; [`MockLauncher::bringing_up`] flips it up.
#[derive(Clone)]
pub struct MockSynthesizer {
    up: Arc<AtomicBool>,
    clip_ms: u32,
    state: Arc<SynthState>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            up: Arc::new(AtomicBool::new(true)),
            clip_ms: 100,
            state: Arc::new(SynthState::default()),
        }
    }

    /// A backend that fails health checks until brought up.
    pub fn down() -> Self {
        let synth = Self::new();
        synth.up.store(false, Ordering::SeqCst);
        synth
    }

    /// Generated clips last `millis` milliseconds.
    pub fn with_clip_ms(mut self, millis: u32) -> Self {
        self.clip_ms = millis;
        self
    }

    pub fn with_voices(self, voices: &[&str]) -> Self {
        if let Ok(mut v) = self.state.voices.lock() {
            *v = voices.iter().map(|s| s.to_string()).collect();
        }
        self
    }

    /// Requests whose text contains `needle` fail.
    pub fn fail_on(&self, needle: &str) {
        if let Ok(mut f) = self.state.failing_texts.lock() {
            f.push(needle.to_string());
        }
    }

    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    /// Shared flag a [`MockLauncher`] can raise.
    pub fn up_flag(&self) -> Arc<AtomicBool> {
        self.up.clone()
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.state
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn health_checks(&self) -> usize {
        self.state.health_checks.load(Ordering::SeqCst)
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSynthesizer {
    fn name(&self) -> &str {
        "mock-synthesizer"
    }

    async fn health_check(&self) -> Result<HealthStatus, StreambotError> {
        self.state.health_checks.fetch_add(1, Ordering::SeqCst);
        if self.up.load(Ordering::SeqCst) {
            Ok(HealthStatus::Healthy)
        } else {
            Err(StreambotError::synthesis("mock backend is down"))
        }
    }
}

#[async_trait]
impl SynthesisBackend for MockSynthesizer {
    async fn generate(&self, request: &SynthesisRequest) -> Result<WavClip, StreambotError> {
        if !self.up.load(Ordering::SeqCst) {
            return Err(StreambotError::synthesis("mock backend is down"));
        }
        if let Ok(mut r) = self.state.requests.lock() {
            r.push(request.clone());
        }
        let fails = self
            .state
            .failing_texts
            .lock()
            .map(|f| f.iter().any(|n| request.text.contains(n.as_str())))
            .unwrap_or(false);
        if fails {
            return Err(StreambotError::synthesis("mock synthesis failure"));
        }
        Ok(wav_clip(self.clip_ms))
    }

    async fn voices(&self) -> Result<Vec<String>, StreambotError> {
        Ok(self
            .state
            .voices
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default())
    }
}

/// A launcher that records commands and optionally raises a backend's
/// "up" flag when started.
#[derive(Clone, Default)]
pub struct MockLauncher {
    started: Arc<Mutex<Vec<String>>>,
    stopped: Arc<Mutex<Vec<ProcessHandle>>>,
    brings_up: Option<Arc<AtomicBool>>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting any command marks `synth` as up.
    pub fn bringing_up(synth: &MockSynthesizer) -> Self {
        Self {
            brings_up: Some(synth.up_flag()),
            ..Self::default()
        }
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn stopped(&self) -> Vec<ProcessHandle> {
        self.stopped.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RemoteLauncher for MockLauncher {
    async fn start(&self, command: &str) -> Result<ProcessHandle, StreambotError> {
        let n = match self.started.lock() {
            Ok(mut started) => {
                started.push(command.to_string());
                started.len()
            }
            Err(_) => 0,
        };
        if let Some(flag) = &self.brings_up {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(ProcessHandle(format!("pid-{n}")))
    }

    async fn stop(&self, handle: &ProcessHandle) -> Result<(), StreambotError> {
        if let Ok(mut stopped) = self.stopped.lock() {
            stopped.push(handle.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn launcher_brings_backend_up() {
        let synth = MockSynthesizer::down();
        assert!(synth.health_check().await.is_err());
        let launcher = MockLauncher::bringing_up(&synth);
        let handle = launcher.start("run tts").await.unwrap();
        assert!(synth.health_check().await.is_ok());
        launcher.stop(&handle).await.unwrap();
        assert_eq!(launcher.started(), vec!["run tts"]);
        assert_eq!(launcher.stopped(), vec![handle]);
        assert_eq!(synth.health_checks(), 2);
    }

    #[tokio::test]
    async fn generate_records_and_can_fail() {
        let synth = MockSynthesizer::new().with_clip_ms(50);
        synth.fail_on("boom");
        let ok = SynthesisRequest {
            text: "hello".into(),
            voice: "v.wav".into(),
            narrator_voice: None,
        };
        let clip = synth.generate(&ok).await.unwrap();
        assert_eq!(clip.duration().as_millis(), 50);
        let bad = SynthesisRequest {
            text: "boom".into(),
            ..ok
        };
        assert!(synth.generate(&bad).await.is_err());
        assert_eq!(synth.requests().len(), 2);
    }
}
