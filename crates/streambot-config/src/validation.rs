// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Collects every problem instead of failing on the first so the operator
//! can fix the file in one pass.

use std::net::IpAddr;

use crate::diagnostic::ConfigError;
use crate::model::StreambotConfig;

/// Validates semantic constraints serde cannot express.
pub fn validate_config(config: &StreambotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let capacities = [
        ("bus.aggregator_capacity", config.bus.aggregator_capacity),
        ("bus.tts_capacity", config.bus.tts_capacity),
        ("bus.playback_capacity", config.bus.playback_capacity),
        ("bus.platform_capacity", config.bus.platform_capacity),
        ("bus.obs_capacity", config.bus.obs_capacity),
        ("gateway.client_buffer", config.gateway.client_buffer),
    ];
    for (key, value) in capacities {
        if value == 0 {
            errors.push(ConfigError::validation(key, "must be greater than zero"));
        }
    }

    if config.agent.chat_history == 0 {
        errors.push(ConfigError::validation(
            "agent.chat_history",
            "must be at least 1",
        ));
    }

    if config.agent.login_command.trim().is_empty() {
        errors.push(ConfigError::validation(
            "agent.login_command",
            "must not be empty",
        ));
    }

    if config.tts.enabled {
        let url = config.tts.base_url.trim();
        if url.is_empty() {
            errors.push(ConfigError::validation("tts.base_url", "must not be empty"));
        } else if !looks_like_http_url(url) {
            errors.push(ConfigError::validation(
                "tts.base_url",
                format!("`{url}` is not an http(s) URL"),
            ));
        }
        if config.tts.startup_attempts == 0 {
            errors.push(ConfigError::validation(
                "tts.startup_attempts",
                "must be at least 1",
            ));
        }
    }

    if config.audio.player_command.is_empty()
        || config.audio.player_command[0].trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "audio.player_command",
            "must name a program",
        ));
    }

    for addr in &config.gateway.admin_addresses {
        if addr.trim().parse::<IpAddr>().is_err() {
            errors.push(ConfigError::validation(
                "gateway.admin_addresses",
                format!("`{addr}` is not an IP address"),
            ));
        }
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::validation("gateway.host", "must not be empty"));
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::validation("gateway.port", "must not be 0"));
    }

    if config.gateway.max_message_size == 0 {
        errors.push(ConfigError::validation(
            "gateway.max_message_size",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn looks_like_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) => !host.is_empty() && !host.starts_with('/'),
        None => false,
    }
}
