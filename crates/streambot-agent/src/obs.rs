// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OBS connector: tracks the program scene, derives the microphone flag
//! from volume meters and executes scene switches.

use std::sync::Arc;
use std::time::Duration;

use streambot_bus::{MicState, ObsCommand, Signals};
use streambot_core::traits::obs::{InputLevels, ObsEvent};
use streambot_core::{ObsController, PluginAdapter};
use streambot_resilience::Backoff;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// OBS input whose meter drives the microphone flag.
pub const MIC_INPUT: &str = "Mic/Aux";
/// Peak level above which the microphone counts as active.
pub const MIC_THRESHOLD_DB: f64 = -35.0;
/// Quiet time after which the microphone counts as silent again.
pub const MIC_HOLD: Duration = Duration::from_secs(3);

/// Turns meter snapshots into the shared microphone flag.
#[derive(Debug)]
pub struct MicActivityTracker {
    mic: Arc<MicState>,
    last_active: Option<Instant>,
}

impl MicActivityTracker {
    pub fn new(mic: Arc<MicState>) -> Self {
        Self {
            mic,
            last_active: None,
        }
    }

    /// Feeds one snapshot observed at `now`. Returns the resulting flag.
    pub fn observe(&mut self, inputs: &[InputLevels], now: Instant) -> bool {
        let peak = inputs
            .iter()
            .filter(|input| input.name == MIC_INPUT)
            .flat_map(|input| input.levels.iter().flatten())
            .copied()
            .fold(0.0_f64, f64::max);

        if peak_db(peak) > MIC_THRESHOLD_DB {
            self.last_active = Some(now);
        }
        let active = self
            .last_active
            .is_some_and(|at| now.duration_since(at) < MIC_HOLD);
        if self.mic.set_active(active) != active {
            debug!(active, "microphone state changed");
        }
        active
    }

    /// Forces the flag off, used when meters stop arriving.
    pub fn reset(&mut self) {
        self.last_active = None;
        self.mic.set_active(false);
    }
}

fn peak_db(level: f64) -> f64 {
    if level <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * level.log10()
    }
}

pub struct ObsConnector {
    controller: Box<dyn ObsController>,
    signals: Signals,
    commands: mpsc::Receiver<ObsCommand>,
    tracker: MicActivityTracker,
}

impl ObsConnector {
    pub fn new(
        controller: Box<dyn ObsController>,
        signals: Signals,
        commands: mpsc::Receiver<ObsCommand>,
    ) -> Self {
        let tracker = MicActivityTracker::new(signals.mic.clone());
        Self {
            controller,
            signals,
            commands,
            tracker,
        }
    }

    pub async fn run(mut self) {
        let mut backoff = Backoff::new("OBS connection");
        loop {
            backoff.attempt().await;
            match self.controller.connect().await {
                Ok(scene) => {
                    info!(controller = self.controller.name(), %scene, "connected to OBS");
                    backoff.success();
                    self.signals.scene.set(scene);
                }
                Err(e) => {
                    warn!(error = %e, attempts = backoff.attempts(), "OBS connect failed");
                    continue;
                }
            }
            self.session().await;
            self.tracker.reset();
            self.signals.scene.clear();
        }
    }

    async fn session(&mut self) {
        loop {
            tokio::select! {
                event = self.controller.next_event() => match event {
                    Ok(Some(ObsEvent::VolumeMeters(inputs))) => {
                        self.tracker.observe(&inputs, Instant::now());
                    }
                    Ok(Some(ObsEvent::SceneChanged(scene))) => {
                        info!(%scene, "scene changed");
                        self.signals.scene.set(scene);
                    }
                    Ok(None) => {
                        warn!("OBS connection closed");
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, "OBS event stream failed");
                        return;
                    }
                },
                Some(command) = self.commands.recv() => self.execute(command).await,
            }
        }
    }

    async fn execute(&self, command: ObsCommand) {
        match command {
            ObsCommand::SwitchScene { scene, reply } => {
                let result = self.controller.switch_scene(&scene).await;
                match &result {
                    Ok(()) => {
                        info!(%scene, "switched scene");
                        self.signals.scene.set(scene);
                    }
                    Err(e) => warn!(%scene, error = %e, "scene switch failed"),
                }
                if let Some(reply) = reply {
                    // The requester may have stopped waiting.
                    let _ = reply.send(result);
                }
            }
        }
    }
}
