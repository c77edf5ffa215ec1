// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The TTS pipeline.
//!
//! Each cycle probes the backend, launches it if it is down, loads the
//! voice catalog and then drains the TTS queue until the backend is lost.
//! Synthesized clips go to the playback queue without blocking.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::json;
use streambot_agent::IdentityRegistry;
use streambot_bus::{MessageBus, SendOutcome, TtsMessage};
use streambot_config::model::TtsConfig;
use streambot_core::traits::{ProcessHandle, SynthesisRequest};
use streambot_core::{
    Alert, Broadcaster, ChatEntry, HealthStatus, PlaybackRequest, PluginAdapter, RemoteLauncher,
    StreambotError, SynthesisBackend, WavClip,
};
use streambot_resilience::Backoff;
use streambot_storage::MutedSet;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::vocalize::{SpeakerTracker, alert_prompt, chat_prompt, vocalize_html};

/// Time between revealing an alert and starting its audio, and after the
/// audio before the next clip.
pub const ALERT_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Probing,
    Starting,
    Operational,
    Synthesizing,
}

enum Served {
    QueueClosed,
    BackendLost,
}

pub struct TtsPipeline {
    backend: Arc<dyn SynthesisBackend>,
    launcher: Option<Arc<dyn RemoteLauncher>>,
    bus: MessageBus,
    broadcaster: Arc<dyn Broadcaster>,
    registry: Arc<IdentityRegistry>,
    muted: Arc<MutedSet>,
    config: TtsConfig,
    state: PipelineState,
    speaker: SpeakerTracker,
    launched: Option<ProcessHandle>,
}

impl TtsPipeline {
    pub fn new(
        config: TtsConfig,
        backend: Arc<dyn SynthesisBackend>,
        bus: MessageBus,
        broadcaster: Arc<dyn Broadcaster>,
        registry: Arc<IdentityRegistry>,
        muted: Arc<MutedSet>,
    ) -> Self {
        Self {
            backend,
            launcher: None,
            bus,
            broadcaster,
            registry,
            muted,
            config,
            state: PipelineState::Probing,
            speaker: SpeakerTracker::default(),
            launched: None,
        }
    }

    /// Enables starting the backend with `start_command` when it is down.
    pub fn with_launcher(mut self, launcher: Arc<dyn RemoteLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "tts state");
            self.state = next;
        }
    }

    /// Runs until the TTS queue closes, then stops any backend it launched.
    pub async fn run(mut self, mut rx: mpsc::Receiver<TtsMessage>) {
        let mut backoff = Backoff::new("TTS backend");
        loop {
            backoff.attempt().await;
            self.transition(PipelineState::Probing);
            if !self.probe().await {
                info!("synthesis backend is down");
                self.transition(PipelineState::Starting);
                if !self.start_backend().await {
                    continue;
                }
            }
            if let Err(e) = self.init_voices().await {
                warn!(error = %e, "failed to initialize voices");
                continue;
            }
            backoff.success();
            self.transition(PipelineState::Operational);
            info!("TTS operational");

            match self.serve(&mut rx).await {
                Served::QueueClosed => break,
                Served::BackendLost => warn!("synthesis backend lost"),
            }
        }
        self.stop_launched().await;
    }

    async fn serve(&mut self, rx: &mut mpsc::Receiver<TtsMessage>) -> Served {
        while let Some(msg) = rx.recv().await {
            self.transition(PipelineState::Synthesizing);
            let outcome = self.process(msg).await;
            self.transition(PipelineState::Operational);
            if let Err(e) = outcome {
                warn!(error = %e, "synthesis failed, skipping message");
                if !self.probe().await {
                    return Served::BackendLost;
                }
            }
        }
        Served::QueueClosed
    }

    /// Handles one queued item. Errors mean only this item was lost.
    pub async fn process(&mut self, msg: TtsMessage) -> Result<(), StreambotError> {
        match msg {
            TtsMessage::Chat(entry) => self.speak_chat(entry).await,
            TtsMessage::Alert(alert) => self.speak_alert(alert).await,
        }
    }

    async fn speak_chat(&mut self, entry: ChatEntry) -> Result<(), StreambotError> {
        if self.muted.is_muted(&entry.author) {
            debug!(author = %entry.author.key(), "author muted, not speaking");
            return Ok(());
        }
        if entry.tts_text.trim().is_empty() {
            return Ok(());
        }

        let voice = self
            .registry
            .voice_for(&entry.author)
            .unwrap_or_else(|| self.config.default_voice.clone());
        let message = vocalize_html(&entry.tts_text);
        let same = self.speaker.same_speaker(&entry.author.key());
        let text = chat_prompt(entry.author.display_name(), &message, same);

        let clip = self.synthesize(text, voice).await?;
        let request = PlaybackRequest::new(clip).with_author(entry.author);
        if self.bus.enqueue_playback(request) == SendOutcome::Dropped {
            warn!("player busy, dropping TTS message");
        }
        Ok(())
    }

    async fn speak_alert(&mut self, alert: Alert) -> Result<(), StreambotError> {
        let text = alert_prompt(&vocalize_html(&alert.html));
        let clip = self.synthesize(text, self.config.default_voice.clone()).await?;
        let duration_ms = u64::try_from(clip.duration().as_millis()).unwrap_or(u64::MAX);

        let Alert {
            html,
            announce,
            on_play,
        } = alert;
        let broadcaster = self.broadcaster.clone();
        let bus = self.bus.clone();
        let request = PlaybackRequest::new(clip)
            .with_pre_play(move || {
                async move {
                    if let Some(hook) = on_play {
                        hook().await;
                    }
                    broadcaster.broadcast("ShowAlert", vec![json!(html), json!(duration_ms)]);
                    if let Some(entry) = announce {
                        if let Err(e) = bus.enqueue_chat(entry).await {
                            warn!(error = %e, "could not post alert announcement");
                        }
                    }
                    tokio::time::sleep(ALERT_PAUSE).await;
                }
                .boxed()
            })
            .with_post_play(|| tokio::time::sleep(ALERT_PAUSE).boxed());
        if self.bus.enqueue_playback(request) == SendOutcome::Dropped {
            warn!("player busy, dropping alert");
        }
        Ok(())
    }

    async fn synthesize(&self, text: String, voice: String) -> Result<WavClip, StreambotError> {
        let request = SynthesisRequest {
            text,
            voice,
            narrator_voice: Some(self.config.narrator_voice.clone()),
        };
        self.backend.generate(&request).await
    }

    async fn probe(&self) -> bool {
        matches!(
            self.backend.health_check().await,
            Ok(HealthStatus::Healthy | HealthStatus::Degraded(_))
        )
    }

    /// Launches the backend and polls until it answers or the attempts run out.
    async fn start_backend(&mut self) -> bool {
        let (Some(launcher), Some(command)) = (&self.launcher, &self.config.start_command) else {
            warn!("synthesis backend down and no start command configured");
            return false;
        };
        let launcher = launcher.clone();
        let command = command.clone();

        self.stop_launched().await;
        match launcher.start(&command).await {
            Ok(handle) => self.launched = Some(handle),
            Err(e) => {
                warn!(error = %e, "failed to launch synthesis backend");
                return false;
            }
        }

        let interval = Duration::from_millis(self.config.startup_interval_ms);
        for attempt in 0..self.config.startup_attempts {
            if self.probe().await {
                info!(attempt, "synthesis backend came up");
                return true;
            }
            tokio::time::sleep(interval).await;
        }
        warn!(
            attempts = self.config.startup_attempts,
            "synthesis backend did not become operational"
        );
        false
    }

    async fn stop_launched(&mut self) {
        let (Some(launcher), Some(handle)) = (&self.launcher, self.launched.take()) else {
            return;
        };
        if let Err(e) = launcher.stop(&handle).await {
            warn!(handle = %handle.0, error = %e, "failed to stop synthesis backend");
        }
    }

    async fn init_voices(&self) -> Result<(), StreambotError> {
        let voices = self.backend.voices().await?;
        if let Some(dir) = &self.config.samples_dir {
            self.generate_samples(dir, &voices).await?;
        }
        info!(count = voices.len(), "voices available");
        self.bus.signals().voices.publish(voices);
        Ok(())
    }

    /// Writes one sample per voice into `dir`, skipping existing files.
    async fn generate_samples(&self, dir: &Path, voices: &[String]) -> Result<(), StreambotError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(StreambotError::storage)?;
        for voice in voices {
            if Path::new(voice).file_name().and_then(|n| n.to_str()) != Some(voice.as_str()) {
                warn!(%voice, "skipping sample for voice with a path in its name");
                continue;
            }
            let path = dir.join(voice);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }
            info!(%voice, "generating voice sample");
            let style = voice.strip_suffix(".wav").unwrap_or(voice);
            let text = format!("This is a voice sample in the style of {style}");
            let clip = self.synthesize(text, voice.clone()).await?;
            tokio::fs::write(&path, clip.bytes())
                .await
                .map_err(StreambotError::storage)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streambot_bus::BusReceivers;
    use streambot_config::model::BusConfig;
    use streambot_core::User;
    use streambot_test_utils::{MockSynthesizer, RecordingBroadcaster, twitch_user};

    struct Setup {
        pipeline: TtsPipeline,
        rx: BusReceivers,
        synth: MockSynthesizer,
        muted: Arc<MutedSet>,
        registry: Arc<IdentityRegistry>,
        _dir: tempfile::TempDir,
    }

    fn setup() -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let (bus, rx) = MessageBus::new(&BusConfig::default());
        let synth = MockSynthesizer::new();
        let muted = Arc::new(MutedSet::empty(dir.path().join("muted.txt")));
        let registry = Arc::new(IdentityRegistry::in_memory());
        let pipeline = TtsPipeline::new(
            TtsConfig::default(),
            Arc::new(synth.clone()),
            bus,
            Arc::new(RecordingBroadcaster::new()),
            registry.clone(),
            muted.clone(),
        );
        Setup {
            pipeline,
            rx,
            synth,
            muted,
            registry,
            _dir: dir,
        }
    }

    fn entry(author: User, text: &str) -> ChatEntry {
        ChatEntry::new(author, text).with_tts(text)
    }

    #[tokio::test]
    async fn muted_author_is_never_synthesized() {
        let mut s = setup();
        let alice = twitch_user("1", "Alice");
        s.muted.toggle(&alice);
        s.pipeline
            .process(TtsMessage::Chat(entry(alice, "hello")))
            .await
            .unwrap();
        assert!(s.synth.requests().is_empty());
        assert!(s.rx.playback.try_recv().is_err());
    }

    #[tokio::test]
    async fn account_voice_overrides_default() {
        let mut s = setup();
        let alice = twitch_user("1", "Alice");
        let account = s.registry.login_with_password("pw", streambot_core::ClientId(1));
        s.registry
            .redeem_ticket(account.ticket.as_deref().unwrap(), &alice)
            .unwrap();
        s.registry.set_voice(&account.id, "female_01.wav");

        s.pipeline
            .process(TtsMessage::Chat(entry(alice, "hi")))
            .await
            .unwrap();
        s.pipeline
            .process(TtsMessage::Chat(entry(twitch_user("2", "Bob"), "yo")))
            .await
            .unwrap();

        let voices: Vec<_> = s.synth.requests().into_iter().map(|r| r.voice).collect();
        assert_eq!(voices, vec!["female_01.wav", "SMOrc.wav"]);
        let narrators: Vec<_> = s
            .synth
            .requests()
            .into_iter()
            .map(|r| r.narrator_voice)
            .collect();
        assert!(narrators.iter().all(|n| n.as_deref() == Some("bg3_narrator.wav")));
    }

    #[tokio::test]
    async fn empty_tts_text_is_skipped() {
        let mut s = setup();
        s.pipeline
            .process(TtsMessage::Chat(ChatEntry::new(twitch_user("1", "A"), "x")))
            .await
            .unwrap();
        assert!(s.synth.requests().is_empty());
    }

    #[tokio::test]
    async fn playback_carries_author() {
        let mut s = setup();
        s.pipeline
            .process(TtsMessage::Chat(entry(twitch_user("1", "Alice"), "hi")))
            .await
            .unwrap();
        let request = s.rx.playback.try_recv().unwrap();
        assert_eq!(request.author.map(|a| a.key()), Some("Twitch:1".to_string()));
        assert!(request.pre_play.is_none());
    }

    #[tokio::test]
    async fn failed_synthesis_is_reported_and_skipped() {
        let mut s = setup();
        s.synth.fail_on("boom");
        let result = s
            .pipeline
            .process(TtsMessage::Chat(entry(twitch_user("1", "Alice"), "boom")))
            .await;
        assert!(result.is_err());
        assert!(s.rx.playback.try_recv().is_err());
    }
}
