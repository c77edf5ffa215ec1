// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level streambot configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreambotConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Queue capacities.
    #[serde(default)]
    pub bus: BusConfig,

    /// Synthesis backend and TTS pipeline settings.
    #[serde(default)]
    pub tts: TtsConfig,

    /// Audio output settings.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Web overlay server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Content filter at the chat ingestion boundary.
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the chat log, counter, mute and account files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding one-secret-per-file credentials.
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: PathBuf,

    /// Size of the in-memory chat ring replayed to new clients.
    #[serde(default = "default_chat_history")]
    pub chat_history: usize,

    /// Chat command that redeems a login ticket.
    #[serde(default = "default_login_command")]
    pub login_command: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
            secrets_dir: default_secrets_dir(),
            chat_history: default_chat_history(),
            login_command: default_login_command(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_secrets_dir() -> PathBuf {
    PathBuf::from("secrets")
}

fn default_chat_history() -> usize {
    20
}

fn default_login_command() -> String {
    "!login".to_string()
}

/// Bounded queue capacities.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Chat entries, alerts and control messages into the aggregator.
    #[serde(default = "default_aggregator_capacity")]
    pub aggregator_capacity: usize,

    /// Entries waiting for synthesis.
    #[serde(default = "default_tts_capacity")]
    pub tts_capacity: usize,

    /// Synthesized clips waiting for playback.
    #[serde(default = "default_playback_capacity")]
    pub playback_capacity: usize,

    /// Commands per platform connector.
    #[serde(default = "default_platform_capacity")]
    pub platform_capacity: usize,

    /// OBS commands.
    #[serde(default = "default_obs_capacity")]
    pub obs_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            aggregator_capacity: default_aggregator_capacity(),
            tts_capacity: default_tts_capacity(),
            playback_capacity: default_playback_capacity(),
            platform_capacity: default_platform_capacity(),
            obs_capacity: default_obs_capacity(),
        }
    }
}

fn default_aggregator_capacity() -> usize {
    256
}

fn default_tts_capacity() -> usize {
    10
}

fn default_playback_capacity() -> usize {
    20
}

fn default_platform_capacity() -> usize {
    100
}

fn default_obs_capacity() -> usize {
    64
}

/// Synthesis backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TtsConfig {
    /// Disables the whole TTS pipeline when false.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the synthesis HTTP service.
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,

    /// Voice used for authors without a preference and for alerts.
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// Narrator voice for text outside quotes.
    #[serde(default = "default_narrator_voice")]
    pub narrator_voice: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Shell command that starts the backend. `None` disables remote start.
    #[serde(default)]
    pub start_command: Option<String>,

    /// Shell command that stops the backend; `{handle}` is replaced with the
    /// handle printed by `start_command`.
    #[serde(default)]
    pub stop_command: Option<String>,

    /// Health polls after a remote start before giving up.
    #[serde(default = "default_startup_attempts")]
    pub startup_attempts: u32,

    #[serde(default = "default_startup_interval_ms")]
    pub startup_interval_ms: u64,

    /// Where per-voice samples are written. `None` skips sample generation.
    #[serde(default)]
    pub samples_dir: Option<PathBuf>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_tts_base_url(),
            default_voice: default_voice(),
            narrator_voice: default_narrator_voice(),
            language: default_language(),
            start_command: None,
            stop_command: None,
            startup_attempts: default_startup_attempts(),
            startup_interval_ms: default_startup_interval_ms(),
            samples_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tts_base_url() -> String {
    "http://127.0.0.1:7851".to_string()
}

fn default_voice() -> String {
    "SMOrc.wav".to_string()
}

fn default_narrator_voice() -> String {
    "bg3_narrator.wav".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_startup_attempts() -> u32 {
    60
}

fn default_startup_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Audio output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AudioConfig {
    /// Player program and arguments; the WAV is written to its stdin.
    #[serde(default = "default_player_command")]
    pub player_command: Vec<String>,

    /// Poll interval while waiting for the microphone to go silent.
    #[serde(default = "default_mic_poll_ms")]
    pub mic_poll_ms: u64,

    /// Poll interval while waiting for a clip to finish.
    #[serde(default = "default_finish_poll_ms")]
    pub finish_poll_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            player_command: default_player_command(),
            mic_poll_ms: default_mic_poll_ms(),
            finish_poll_ms: default_finish_poll_ms(),
        }
    }
}

fn default_player_command() -> Vec<String> {
    vec!["aplay".to_string(), "-q".to_string(), "-".to_string()]
}

fn default_mic_poll_ms() -> u64 {
    100
}

fn default_finish_poll_ms() -> u64 {
    10
}

/// Web overlay server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Client addresses granted the admin capability.
    #[serde(default = "default_admin_addresses")]
    pub admin_addresses: Vec<String>,

    /// Bearer token for the ingest endpoint. Falls back to the
    /// `gateway_token.txt` secret; without either the endpoint is disabled.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Directory served as the overlay front end.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Outbound messages buffered per client before it is disconnected.
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,

    /// Largest inbound websocket message accepted, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    /// Broadcast `Reload` when files under `static_dir` change.
    #[serde(default = "default_true")]
    pub watch_static: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_addresses: default_admin_addresses(),
            bearer_token: None,
            static_dir: default_static_dir(),
            client_buffer: default_client_buffer(),
            max_message_size: default_max_message_size(),
            watch_static: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3447
}

fn default_admin_addresses() -> Vec<String> {
    vec!["127.0.0.1".to_string(), "::1".to_string()]
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_client_buffer() -> usize {
    256
}

fn default_max_message_size() -> usize {
    1024
}

/// Content filter settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Case-insensitive phrases that suppress a chat message.
    #[serde(default)]
    pub blocked_phrases: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = StreambotConfig::default();
        assert_eq!(config.agent.chat_history, 20);
        assert_eq!(config.bus.tts_capacity, 10);
        assert_eq!(config.bus.playback_capacity, 20);
        assert_eq!(config.tts.startup_attempts, 60);
        assert_eq!(config.audio.mic_poll_ms, 100);
        assert_eq!(config.gateway.port, 3447);
        assert_eq!(config.gateway.client_buffer, 256);
        assert!(config.gateway.watch_static);
        assert!(config.filter.blocked_phrases.is_empty());
    }

    #[test]
    fn serialized_defaults_deserialize_back() {
        let toml = toml::to_string(&StreambotConfig::default()).unwrap();
        let parsed: StreambotConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.tts.base_url, "http://127.0.0.1:7851");
        assert_eq!(parsed.audio.player_command, vec!["aplay", "-q", "-"]);
    }
}
