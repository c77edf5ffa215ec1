// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio device backed by an external player program.
//!
//! Each clip spawns `player_command` and streams the WAV bytes into its
//! stdin. The clip is playing for as long as the child runs.

use std::process::Stdio;

use async_trait::async_trait;
use streambot_core::{AudioDevice, AudioDeviceFactory, StreambotError, WavClip};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ProcessAudioFactory {
    command: Vec<String>,
}

impl ProcessAudioFactory {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl AudioDeviceFactory for ProcessAudioFactory {
    async fn open(&self) -> Result<Box<dyn AudioDevice>, StreambotError> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(StreambotError::audio("player command is empty"));
        };
        Ok(Box::new(ProcessAudioDevice {
            program: program.clone(),
            args: args.to_vec(),
            child: None,
        }))
    }
}

pub struct ProcessAudioDevice {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl ProcessAudioDevice {
    async fn kill_current(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                debug!(error = %e, "player already gone");
            }
        }
    }
}

#[async_trait]
impl AudioDevice for ProcessAudioDevice {
    async fn play(&mut self, clip: &WavClip) -> Result<(), StreambotError> {
        self.kill_current().await;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| StreambotError::Audio {
                message: format!("failed to start `{}`: {e}", self.program),
                source: Some(Box::new(e)),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let bytes = clip.bytes().to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&bytes).await {
                    debug!(error = %e, "player closed its input early");
                }
            });
        }
        self.child = Some(child);
        Ok(())
    }

    async fn is_playing(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                if !status.success() {
                    warn!(program = %self.program, %status, "player exited with failure");
                }
                self.child = None;
                false
            }
            Err(e) => {
                warn!(error = %e, "failed to poll player");
                self.child = None;
                false
            }
        }
    }

    async fn pause(&mut self) -> Result<(), StreambotError> {
        self.kill_current().await;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn clip() -> WavClip {
        streambot_core::wav::silence(8000, 80).unwrap()
    }

    fn sh(script: &str) -> ProcessAudioFactory {
        ProcessAudioFactory::new(vec!["sh".into(), "-c".into(), script.into()])
    }

    async fn wait_stopped(device: &mut dyn AudioDevice) {
        for _ in 0..200 {
            if !device.is_playing().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("player never exited");
    }

    #[tokio::test]
    async fn empty_command_cannot_open() {
        assert!(ProcessAudioFactory::new(vec![]).open().await.is_err());
    }

    #[tokio::test]
    async fn clip_is_playing_until_player_exits() {
        let mut device = sh("cat > /dev/null").open().await.unwrap();
        assert!(!device.is_playing().await);
        device.play(&clip()).await.unwrap();
        wait_stopped(device.as_mut()).await;
    }

    #[tokio::test]
    async fn pause_kills_player() {
        let mut device = sh("sleep 30").open().await.unwrap();
        device.play(&clip()).await.unwrap();
        assert!(device.is_playing().await);
        device.pause().await.unwrap();
        assert!(!device.is_playing().await);
    }

    #[tokio::test]
    async fn missing_program_fails_to_play() {
        let factory = ProcessAudioFactory::new(vec!["/nonexistent/streambot-player".into()]);
        let mut device = factory.open().await.unwrap();
        assert!(device.play(&clip()).await.is_err());
    }
}
