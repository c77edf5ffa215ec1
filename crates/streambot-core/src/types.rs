// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared by every streambot crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::html::escape_html;
use crate::playback::PlaybackHook;

/// Key prefix for Twitch identities.
pub const TWITCH_KEY_PREFIX: &str = "Twitch:";
/// Key prefix for YouTube identities.
pub const YOUTUBE_KEY_PREFIX: &str = "YouTube:";
/// Key prefix for Discord identities.
pub const DISCORD_KEY_PREFIX: &str = "Discord:";
/// Key prefix for password-only web identities.
pub const ANONYMOUS_KEY_PREFIX: &str = "Anonymous:";
/// Key of the synthetic system identity.
pub const BOT_KEY: &str = "Bot";

/// Inline icon used for system messages.
pub const BOT_ICON: &str = r#"<img src="bot.svg" class="emoji">"#;
/// Inline icon announcing a mute.
pub const MUTED_ICON: &str = r#"<img src="muted.svg" class="emoji">"#;
/// Inline icon announcing an unmute.
pub const UNMUTED_ICON: &str = r#"<img src="unmuted.svg" class="emoji">"#;

/// External platform a chat message or command belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Twitch,
    YouTube,
    Discord,
}

impl Platform {
    /// All platforms, in command fan-out order.
    pub const ALL: [Platform; 3] = [Platform::Twitch, Platform::YouTube, Platform::Discord];

    /// HTML icon prefixed to rendered chat lines from this platform.
    pub fn icon(&self) -> &'static str {
        match self {
            Platform::Twitch => r#"<img src="twitch.svg" class="emoji">"#,
            Platform::YouTube => r#"<img src="youtube.svg" class="emoji">"#,
            Platform::Discord => r#"<img src="discord.svg" class="emoji">"#,
        }
    }
}

/// Health status reported by collaborator health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Collaborator is fully operational.
    Healthy,
    /// Collaborator is operational but experiencing issues.
    Degraded(String),
    /// Collaborator is not operational.
    Unhealthy(String),
}

/// Twitch chatter identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchUser {
    pub id: String,
    pub login: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// YouTube channel identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YouTubeUser {
    pub channel_id: String,
    pub name: String,
}

/// Discord account identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A web client that logged in with a password and has no platform identity yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousUser {
    pub account_id: String,
}

/// The identity a chat entry or command refers to.
///
/// Exactly one platform identity per value; accounts linking several
/// identities are modelled by [`Account`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum User {
    Twitch(TwitchUser),
    YouTube(YouTubeUser),
    Discord(DiscordUser),
    Bot,
    Anonymous(AnonymousUser),
}

impl User {
    /// Globally unique, platform-prefixed identity key.
    pub fn key(&self) -> String {
        match self {
            User::Twitch(u) => format!("{TWITCH_KEY_PREFIX}{}", u.id),
            User::YouTube(u) => format!("{YOUTUBE_KEY_PREFIX}{}", u.channel_id),
            User::Discord(u) => format!("{DISCORD_KEY_PREFIX}{}", u.id),
            User::Bot => BOT_KEY.to_string(),
            User::Anonymous(u) => format!("{ANONYMOUS_KEY_PREFIX}{}", u.account_id),
        }
    }

    /// Human-presentable name.
    pub fn display_name(&self) -> &str {
        match self {
            User::Twitch(u) => &u.name,
            User::YouTube(u) => &u.name,
            User::Discord(u) => &u.username,
            User::Bot => "Bot",
            User::Anonymous(_) => "Anonymous",
        }
    }

    /// The platform this identity lives on, if any.
    pub fn platform(&self) -> Option<Platform> {
        match self {
            User::Twitch(_) => Some(Platform::Twitch),
            User::YouTube(_) => Some(Platform::YouTube),
            User::Discord(_) => Some(Platform::Discord),
            User::Bot | User::Anonymous(_) => None,
        }
    }

    /// HTML fragment for the author name, escaped and coloured where the
    /// platform provides a colour.
    pub fn render_html(&self) -> String {
        let name = escape_html(self.display_name());
        match self {
            User::Twitch(TwitchUser {
                color: Some(color), ..
            }) => format!(
                r#"<span class="author" style="color: {}">{name}</span>"#,
                escape_html(color)
            ),
            User::Bot => format!(r#"<span class="author bot">{name}</span>"#),
            _ => format!(r#"<span class="author">{name}</span>"#),
        }
    }

    /// Whether this is the synthetic system identity.
    pub fn is_bot(&self) -> bool {
        matches!(self, User::Bot)
    }
}

/// Upstream handle of a chat message, used for moderation deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformMessageId {
    pub platform: Platform,
    pub id: String,
}

/// A normalized chat or event record.
///
/// The three projections (`rendered_html`, `terminal_text`, `tts_text`) are
/// computed once by the producer. Only the aggregator writes `sequence_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub author: User,
    #[serde(default)]
    pub original_message: String,
    #[serde(rename = "html", default)]
    pub rendered_html: String,
    #[serde(skip)]
    pub terminal_text: String,
    #[serde(skip)]
    pub tts_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_message_id: Option<PlatformMessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<u64>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    /// Creates an entry with empty projections.
    pub fn new(author: User, original_message: impl Into<String>) -> Self {
        Self {
            author,
            original_message: original_message.into(),
            rendered_html: String::new(),
            terminal_text: String::new(),
            tts_text: String::new(),
            platform_message_id: None,
            sequence_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a Bot-authored system entry. System entries are never spoken.
    pub fn system(html: impl Into<String>, terminal: impl Into<String>) -> Self {
        let mut entry = Self::new(User::Bot, "");
        entry.rendered_html = format!("{BOT_ICON} {}", html.into());
        entry.terminal_text = terminal.into();
        entry
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.rendered_html = html.into();
        self
    }

    pub fn with_terminal(mut self, text: impl Into<String>) -> Self {
        self.terminal_text = text.into();
        self
    }

    pub fn with_tts(mut self, text: impl Into<String>) -> Self {
        self.tts_text = text.into();
        self
    }

    pub fn with_message_id(mut self, platform: Platform, id: impl Into<String>) -> Self {
        self.platform_message_id = Some(PlatformMessageId {
            platform,
            id: id.into(),
        });
        self
    }
}

/// A one-shot notable event (follow, raid) shown on the overlay and spoken.
pub struct Alert {
    /// Overlay HTML, also the source of the spoken text.
    pub html: String,
    /// Chat entry posted when the alert becomes visible.
    pub announce: Option<ChatEntry>,
    /// Runs right before the alert is revealed.
    pub on_play: Option<PlaybackHook>,
}

impl Alert {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            announce: None,
            on_play: None,
        }
    }

    pub fn with_announcement(mut self, entry: ChatEntry) -> Self {
        self.announce = Some(entry);
        self
    }

    pub fn with_on_play<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> futures::future::BoxFuture<'static, ()> + Send + 'static,
    {
        self.on_play = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alert")
            .field("html", &self.html)
            .field("announce", &self.announce)
            .field("on_play", &self.on_play.is_some())
            .finish()
    }
}

/// File attached to an inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Attachment {
    /// Whether the attachment should be rendered inline as an image.
    pub fn is_image(&self) -> bool {
        if let Some(content_type) = &self.content_type {
            return content_type.starts_with("image/");
        }
        let lower = self.filename.to_ascii_lowercase();
        [".png", ".jpg", ".jpeg", ".gif", ".webp"]
            .iter()
            .any(|ext| lower.ends_with(ext))
    }
}

/// The shape every platform source delivers before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundChat {
    pub platform: Platform,
    pub author: User,
    pub text: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Moderation and channel commands executed by a platform connector.
///
/// Bridges receive them as `{"type": "delete_message", "message_id": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformCommand {
    /// Delete an upstream chat message.
    DeleteMessage { message_id: String },
    /// Ban a user from the channel.
    Ban { user: User, reason: String },
    /// Change the stream title.
    SetTitle { title: String },
}

/// An aggregate account linking platform identities with local preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitch: Option<TwitchUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<YouTubeUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<DiscordUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Every identity key that resolves to this account.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = vec![format!("{ANONYMOUS_KEY_PREFIX}{}", self.id)];
        keys.extend(self.platform_users().iter().map(User::key));
        keys
    }

    /// Linked platform identities.
    pub fn platform_users(&self) -> Vec<User> {
        let mut users = Vec::new();
        if let Some(u) = &self.twitch {
            users.push(User::Twitch(u.clone()));
        }
        if let Some(u) = &self.youtube {
            users.push(User::YouTube(u.clone()));
        }
        if let Some(u) = &self.discord {
            users.push(User::Discord(u.clone()));
        }
        users
    }

    /// Links a platform identity, replacing any previous one on that platform.
    /// Returns `false` for identities that cannot be linked.
    pub fn link(&mut self, user: &User) -> bool {
        match user {
            User::Twitch(u) => self.twitch = Some(u.clone()),
            User::YouTube(u) => self.youtube = Some(u.clone()),
            User::Discord(u) => self.discord = Some(u.clone()),
            User::Bot | User::Anonymous(_) => return false,
        }
        true
    }
}

/// JSON envelope exchanged with web clients in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEnvelope {
    pub call: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl CallEnvelope {
    pub fn new(call: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            call: call.into(),
            args,
        }
    }
}
