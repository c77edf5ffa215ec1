// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup: `./streambot.toml` > `~/.config/streambot/streambot.toml` >
//! `/etc/streambot/streambot.toml`, with `STREAMBOT_` environment overrides.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::StreambotConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/streambot/streambot.toml";
/// Config file in the working directory.
pub const LOCAL_CONFIG: &str = "streambot.toml";

/// User config file under the platform config dir, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("streambot/streambot.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/streambot/streambot.toml`
/// 3. `~/.config/streambot/streambot.toml`
/// 4. `./streambot.toml`
/// 5. `STREAMBOT_*` environment variables
pub fn load_config() -> Result<StreambotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults only.
pub fn load_config_from_str(toml_content: &str) -> Result<StreambotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StreambotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StreambotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StreambotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(StreambotConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `STREAMBOT_TTS_BASE_URL` must become `tts.base_url`.
fn env_provider() -> Env {
    Env::prefixed("STREAMBOT_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 6] = ["agent", "bus", "tts", "audio", "gateway", "filter"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
