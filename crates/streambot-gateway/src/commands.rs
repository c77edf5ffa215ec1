// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-to-server commands.
//!
//! Web clients send `{"call": name, "args": [...]}`. The name must be one of
//! [`CommandName`]; anything else is logged and ignored. Mutating commands
//! need the admin capability and are silently ignored without it.

use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use streambot_agent::IdentityRegistry;
use streambot_bus::{AggregatorMessage, MessageBus, ObsCommand, SendOutcome};
use streambot_core::types::{MUTED_ICON, UNMUTED_ICON};
use streambot_core::{
    Alert, Broadcaster, CallEnvelope, ChatEntry, ClientId, Platform, PlatformCommand, User,
};
use streambot_storage::MutedSet;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reason attached to bans issued from the overlay.
pub const BAN_REASON: &str = "Banned by the streamer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum CommandName {
    ToggleMuted,
    Ban,
    ShowAlert,
    SetTitle,
    Password,
    ListVoices,
    SetVoice,
    SwitchScene,
}

impl CommandName {
    pub fn requires_admin(self) -> bool {
        matches!(
            self,
            CommandName::ToggleMuted
                | CommandName::Ban
                | CommandName::ShowAlert
                | CommandName::SetTitle
                | CommandName::SwitchScene
        )
    }
}

/// A decoded client command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ToggleMuted(User),
    Ban(User),
    ShowAlert(String),
    SetTitle(String),
    Password(String),
    ListVoices,
    SetVoice(String),
    SwitchScene(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("{call}: {reason}")]
    BadArguments { call: CommandName, reason: String },
}

fn single_arg<T: DeserializeOwned>(call: CommandName, args: Vec<Value>) -> Result<T, CommandError> {
    let [arg]: [Value; 1] = args.try_into().map_err(|args: Vec<Value>| {
        CommandError::BadArguments {
            call,
            reason: format!("expected 1 argument, got {}", args.len()),
        }
    })?;
    serde_json::from_value(arg).map_err(|e| CommandError::BadArguments {
        call,
        reason: e.to_string(),
    })
}

impl Command {
    pub fn parse(envelope: CallEnvelope) -> Result<Self, CommandError> {
        let name = CommandName::from_str(&envelope.call)
            .map_err(|_| CommandError::Unknown(envelope.call.clone()))?;
        let args = envelope.args;
        Ok(match name {
            CommandName::ToggleMuted => Command::ToggleMuted(single_arg(name, args)?),
            CommandName::Ban => Command::Ban(single_arg(name, args)?),
            CommandName::ShowAlert => Command::ShowAlert(single_arg(name, args)?),
            CommandName::SetTitle => Command::SetTitle(single_arg(name, args)?),
            CommandName::Password => Command::Password(single_arg(name, args)?),
            CommandName::ListVoices => Command::ListVoices,
            CommandName::SetVoice => Command::SetVoice(single_arg(name, args)?),
            CommandName::SwitchScene => Command::SwitchScene(single_arg(name, args)?),
        })
    }

    pub fn name(&self) -> CommandName {
        match self {
            Command::ToggleMuted(_) => CommandName::ToggleMuted,
            Command::Ban(_) => CommandName::Ban,
            Command::ShowAlert(_) => CommandName::ShowAlert,
            Command::SetTitle(_) => CommandName::SetTitle,
            Command::Password(_) => CommandName::Password,
            Command::ListVoices => CommandName::ListVoices,
            Command::SetVoice(_) => CommandName::SetVoice,
            Command::SwitchScene(_) => CommandName::SwitchScene,
        }
    }
}

/// The connection a command arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub client: ClientId,
    pub admin: bool,
}

/// Executes commands against the shared registries and the bus.
pub struct CommandHandler {
    bus: MessageBus,
    broadcaster: Arc<dyn Broadcaster>,
    registry: Arc<IdentityRegistry>,
    muted: Arc<MutedSet>,
}

impl CommandHandler {
    pub fn new(
        bus: MessageBus,
        broadcaster: Arc<dyn Broadcaster>,
        registry: Arc<IdentityRegistry>,
        muted: Arc<MutedSet>,
    ) -> Self {
        Self {
            bus,
            broadcaster,
            registry,
            muted,
        }
    }

    /// Decodes and runs one envelope from `session`.
    pub async fn handle(&self, session: Session, envelope: CallEnvelope) {
        match Command::parse(envelope) {
            Ok(command) => self.execute(session, command).await,
            Err(CommandError::Unknown(call)) => {
                debug!(client = %session.client, %call, "unknown command");
            }
            Err(e) => warn!(client = %session.client, error = %e, "rejected command"),
        }
    }

    pub async fn execute(&self, session: Session, command: Command) {
        let name = command.name();
        if name.requires_admin() && !session.admin {
            debug!(client = %session.client, command = %name, "ignoring command from non-admin");
            return;
        }
        match command {
            Command::ToggleMuted(user) => self.toggle_muted(user).await,
            Command::Ban(user) => self.ban(user),
            Command::ShowAlert(html) => self.show_alert(html),
            Command::SetTitle(title) => self.set_title(title).await,
            Command::Password(password) => self.password(session.client, &password),
            Command::ListVoices => self.list_voices(session.client),
            Command::SetVoice(voice) => self.set_voice(session.client, &voice).await,
            Command::SwitchScene(scene) => self.switch_scene(scene).await,
        }
    }

    async fn toggle_muted(&self, user: User) {
        let now_muted = self.muted.toggle(&user);
        let (icon, verb) = if now_muted {
            (MUTED_ICON, "muted")
        } else {
            (UNMUTED_ICON, "unmuted")
        };
        info!(user = %user.display_name(), verb, "mute toggled");
        if let Err(e) = self.muted.save().await {
            warn!(error = %e, "failed to save mute list");
        }
        let entry = ChatEntry::system(
            format!("{icon} {}", user.render_html()),
            format!("{verb} {}", user.display_name()),
        );
        if let Err(e) = self.bus.enqueue_chat(entry).await {
            warn!(error = %e, "could not announce mute change");
        }
    }

    fn ban(&self, user: User) {
        let Some(platform) = user.platform() else {
            debug!(user = %user.key(), "user has no platform to ban on");
            return;
        };
        info!(user = %user.display_name(), %platform, "banning");
        let command = PlatformCommand::Ban {
            user,
            reason: BAN_REASON.to_string(),
        };
        if self.bus.try_platform_command(platform, command) == SendOutcome::Dropped {
            warn!(%platform, "platform busy, ban not sent");
        }
    }

    fn show_alert(&self, html: String) {
        info!(%html, "alert from overlay");
        if self.bus.enqueue_alert(Alert::new(html)) == SendOutcome::Dropped {
            warn!("TTS busy, dropping alert");
        }
    }

    async fn set_title(&self, title: String) {
        if title.trim().is_empty() {
            warn!("cannot set title to empty string");
            return;
        }
        info!(%title, "changing stream title");
        if let Err(e) = self
            .bus
            .aggregator(AggregatorMessage::StreamTitle(title.clone()))
            .await
        {
            warn!(error = %e, "could not record title");
        }
        for platform in Platform::ALL {
            let command = PlatformCommand::SetTitle {
                title: title.clone(),
            };
            if self.bus.try_platform_command(platform, command) == SendOutcome::Dropped {
                debug!(%platform, "title not sent to platform");
            }
        }
    }

    fn password(&self, client: ClientId, password: &str) {
        if self.registry.account_of_client(client).is_some() {
            return;
        }
        let account = self.registry.login_with_password(password, client);
        info!(%client, account = %account.id, "web client logged in");
        match serde_json::to_value(&account) {
            Ok(json) => {
                self.broadcaster.send_to(client, "Welcome", vec![json]);
            }
            Err(e) => warn!(error = %e, "failed to encode account"),
        }
    }

    fn list_voices(&self, client: ClientId) {
        let voices = self.bus.signals().voices.list();
        self.broadcaster
            .send_to(client, "ListVoicesResponse", vec![json!(voices.as_slice())]);
    }

    async fn set_voice(&self, client: ClientId, voice: &str) {
        let Some(account) = self.registry.account_of_client(client) else {
            return;
        };
        if !self.bus.signals().voices.contains(voice) {
            debug!(%voice, "unknown voice requested");
            return;
        }
        self.registry.set_voice(&account.id, voice);
        info!(account = %account.id, %voice, "voice changed");
        if let Err(e) = self.registry.save().await {
            warn!(error = %e, "failed to save accounts");
        }
    }

    async fn switch_scene(&self, scene: String) {
        let command = ObsCommand::SwitchScene { scene, reply: None };
        if let Err(e) = self.bus.obs_command(command).await {
            warn!(error = %e, "could not reach OBS connector");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streambot_bus::BusReceivers;
    use streambot_config::model::BusConfig;
    use streambot_test_utils::{RecordingBroadcaster, twitch_user};

    struct Setup {
        handler: CommandHandler,
        rx: BusReceivers,
        bus: MessageBus,
        recorder: Arc<RecordingBroadcaster>,
        registry: Arc<IdentityRegistry>,
        muted: Arc<MutedSet>,
        _dir: tempfile::TempDir,
    }

    fn setup() -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let (bus, rx) = MessageBus::new(&BusConfig::default());
        let recorder = Arc::new(RecordingBroadcaster::new());
        let registry = Arc::new(IdentityRegistry::in_memory());
        let muted = Arc::new(MutedSet::empty(dir.path().join("muted.txt")));
        let handler = CommandHandler::new(
            bus.clone(),
            recorder.clone(),
            registry.clone(),
            muted.clone(),
        );
        Setup {
            handler,
            rx,
            bus,
            recorder,
            registry,
            muted,
            _dir: dir,
        }
    }

    const ADMIN: Session = Session {
        client: ClientId(1),
        admin: true,
    };
    const VIEWER: Session = Session {
        client: ClientId(2),
        admin: false,
    };

    fn user_json(user: &User) -> Value {
        serde_json::to_value(user).unwrap()
    }

    #[test]
    fn parse_known_and_unknown_calls() {
        let envelope = CallEnvelope::new("SetTitle", vec![json!("New title")]);
        assert_eq!(
            Command::parse(envelope).unwrap(),
            Command::SetTitle("New title".into())
        );
        assert_eq!(
            Command::parse(CallEnvelope::new("ListVoices", vec![])).unwrap(),
            Command::ListVoices
        );
        assert_eq!(
            Command::parse(CallEnvelope::new("DropTables", vec![])),
            Err(CommandError::Unknown("DropTables".into()))
        );
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        let err = Command::parse(CallEnvelope::new("Password", vec![json!("a"), json!("b")]))
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::BadArguments {
                call: CommandName::Password,
                ..
            }
        ));
    }

    #[test]
    fn parse_decodes_users() {
        let alice = twitch_user("1", "Alice");
        let parsed = Command::parse(CallEnvelope::new("Ban", vec![user_json(&alice)])).unwrap();
        assert_eq!(parsed, Command::Ban(alice));
    }

    #[tokio::test]
    async fn toggle_muted_flips_and_announces() {
        let mut s = setup();
        let alice = twitch_user("1", "Alice");
        s.handler
            .execute(ADMIN, Command::ToggleMuted(alice.clone()))
            .await;
        assert!(s.muted.is_muted(&alice));
        match s.rx.aggregator.try_recv() {
            Ok(AggregatorMessage::Chat(entry)) => {
                assert!(entry.rendered_html.contains("muted.svg"));
                assert_eq!(entry.terminal_text, "muted Alice");
            }
            other => panic!("expected announcement, got {other:?}"),
        }

        s.handler.execute(ADMIN, Command::ToggleMuted(alice.clone())).await;
        assert!(!s.muted.is_muted(&alice));
        let saved = std::fs::read_to_string(s._dir.path().join("muted.txt")).unwrap();
        assert!(saved.trim().is_empty());
    }

    #[tokio::test]
    async fn non_admin_mutations_are_ignored() {
        let mut s = setup();
        let alice = twitch_user("1", "Alice");
        for command in [
            Command::ToggleMuted(alice.clone()),
            Command::Ban(alice.clone()),
            Command::ShowAlert("<b>raid</b>".into()),
            Command::SetTitle("pwned".into()),
            Command::SwitchScene("Ending".into()),
        ] {
            s.handler.execute(VIEWER, command).await;
        }
        assert!(!s.muted.is_muted(&alice));
        assert!(s.rx.aggregator.try_recv().is_err());
        assert!(s.rx.tts.try_recv().is_err());
        assert!(s.rx.obs.try_recv().is_err());
        assert!(s.rx.platforms.get_mut(&Platform::Twitch).unwrap().try_recv().is_err());
        assert!(s.recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn ban_routes_to_the_users_platform() {
        let mut s = setup();
        let alice = twitch_user("1", "Alice");
        s.handler.execute(ADMIN, Command::Ban(alice.clone())).await;
        let command = s
            .rx
            .platforms
            .get_mut(&Platform::Twitch)
            .unwrap()
            .try_recv()
            .unwrap();
        assert_eq!(
            command,
            PlatformCommand::Ban {
                user: alice,
                reason: BAN_REASON.into()
            }
        );
        assert!(s.rx.platforms.get_mut(&Platform::YouTube).unwrap().try_recv().is_err());

        s.handler.execute(ADMIN, Command::Ban(User::Bot)).await;
        assert!(s.rx.platforms.get_mut(&Platform::Twitch).unwrap().try_recv().is_err());
    }

    #[tokio::test]
    async fn set_title_fans_out() {
        let mut s = setup();
        s.handler
            .execute(ADMIN, Command::SetTitle("Writing a bot".into()))
            .await;
        assert!(matches!(
            s.rx.aggregator.try_recv(),
            Ok(AggregatorMessage::StreamTitle(t)) if t == "Writing a bot"
        ));
        for platform in Platform::ALL {
            let command = s.rx.platforms.get_mut(&platform).unwrap().try_recv().unwrap();
            assert_eq!(
                command,
                PlatformCommand::SetTitle {
                    title: "Writing a bot".into()
                }
            );
        }
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let mut s = setup();
        s.handler.execute(ADMIN, Command::SetTitle("  ".into())).await;
        assert!(s.rx.aggregator.try_recv().is_err());
    }

    #[tokio::test]
    async fn show_alert_queues_for_tts() {
        let mut s = setup();
        s.handler
            .execute(ADMIN, Command::ShowAlert("<b>Bob</b> raided".into()))
            .await;
        match s.rx.tts.try_recv() {
            Ok(streambot_bus::TtsMessage::Alert(alert)) => assert_eq!(alert.html, "<b>Bob</b> raided"),
            other => panic!("expected alert, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn password_logs_in_once_and_welcomes() {
        let s = setup();
        s.handler
            .execute(VIEWER, Command::Password("hunter2".into()))
            .await;
        let welcome = s.recorder.sent_to(VIEWER.client);
        assert_eq!(welcome.len(), 1);
        assert_eq!(welcome[0].call, "Welcome");
        let account_id = welcome[0].args[0]["id"].as_str().unwrap().to_string();
        assert_eq!(
            s.registry.account_of_client(VIEWER.client).unwrap().id,
            account_id
        );

        // A second password on the same connection is ignored.
        s.handler
            .execute(VIEWER, Command::Password("other".into()))
            .await;
        assert_eq!(s.recorder.sent_to(VIEWER.client).len(), 1);
    }

    #[tokio::test]
    async fn voices_can_be_listed_and_chosen() {
        let s = setup();
        s.bus
            .signals()
            .voices
            .publish(vec!["SMOrc.wav".into(), "female_01.wav".into()]);

        s.handler.execute(VIEWER, Command::ListVoices).await;
        let response = s.recorder.named("ListVoicesResponse");
        assert_eq!(response[0].args[0], json!(["SMOrc.wav", "female_01.wav"]));

        // Not logged in yet: ignored.
        s.handler
            .execute(VIEWER, Command::SetVoice("female_01.wav".into()))
            .await;
        s.handler
            .execute(VIEWER, Command::Password("pw".into()))
            .await;
        s.handler
            .execute(VIEWER, Command::SetVoice("robot.wav".into()))
            .await;
        let account = s.registry.account_of_client(VIEWER.client).unwrap();
        assert_eq!(account.voice, None);

        s.handler
            .execute(VIEWER, Command::SetVoice("female_01.wav".into()))
            .await;
        let account = s.registry.account_of_client(VIEWER.client).unwrap();
        assert_eq!(account.voice.as_deref(), Some("female_01.wav"));
    }

    #[tokio::test]
    async fn switch_scene_goes_to_obs() {
        let mut s = setup();
        s.handler
            .execute(ADMIN, Command::SwitchScene("Ending".into()))
            .await;
        match s.rx.obs.try_recv() {
            Ok(ObsCommand::SwitchScene { scene, reply }) => {
                assert_eq!(scene, "Ending");
                assert!(reply.is_none());
            }
            Err(e) => panic!("expected scene switch, got {e:?}"),
        }
    }

    #[tokio::test]
    async fn handle_ignores_malformed_envelopes() {
        let s = setup();
        s.handler
            .handle(VIEWER, CallEnvelope::new("SetVoice", vec![json!(42)]))
            .await;
        s.handler
            .handle(VIEWER, CallEnvelope::new("Nope", vec![]))
            .await;
        assert!(s.recorder.calls().is_empty());
    }
}
