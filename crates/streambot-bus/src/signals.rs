// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scalar state shared outside the queues.
//!
//! Each value has one writer: the OBS connector, or the gateway on behalf of
//! an OBS bridge, writes the mic flag and current scene. The TTS pipeline
//! writes the voice catalog.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};

/// Whether the streamer's microphone is currently picking up speech.
#[derive(Debug, Default)]
pub struct MicState {
    active: AtomicBool,
}

impl MicState {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Sets the flag, returning the previous value.
    pub fn set_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::AcqRel)
    }
}

/// Name of the OBS program scene, once known.
#[derive(Debug, Default)]
pub struct CurrentScene {
    name: ArcSwapOption<String>,
}

impl CurrentScene {
    pub fn get(&self) -> Option<Arc<String>> {
        self.name.load_full()
    }

    pub fn set(&self, scene: impl Into<String>) {
        self.name.store(Some(Arc::new(scene.into())));
    }

    pub fn clear(&self) {
        self.name.store(None);
    }
}

/// Voices the synthesis backend offers; empty until the backend is up.
#[derive(Debug)]
pub struct VoiceCatalog {
    voices: ArcSwap<Vec<String>>,
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self {
            voices: ArcSwap::from_pointee(Vec::new()),
        }
    }
}

impl VoiceCatalog {
    pub fn list(&self) -> Arc<Vec<String>> {
        self.voices.load_full()
    }

    pub fn contains(&self, voice: &str) -> bool {
        self.voices.load().iter().any(|v| v == voice)
    }

    pub fn publish(&self, voices: Vec<String>) {
        self.voices.store(Arc::new(voices));
    }
}

/// Handles to every shared scalar.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub mic: Arc<MicState>,
    pub scene: Arc<CurrentScene>,
    pub voices: Arc<VoiceCatalog>,
}
