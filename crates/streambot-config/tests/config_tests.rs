// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the streambot configuration system.

use streambot_config::diagnostic::ConfigError;
use streambot_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
log_level = "debug"
data_dir = "/var/lib/streambot"
chat_history = 50

[bus]
tts_capacity = 5
playback_capacity = 30

[tts]
base_url = "http://10.0.0.5:7851"
default_voice = "female_01.wav"
start_command = "ssh gpu ./start_alltalk.sh"
stop_command = "ssh gpu kill {handle}"
samples_dir = "/tmp/samples"

[audio]
player_command = ["paplay", "--raw"]

[gateway]
port = 8080
admin_addresses = ["10.0.0.2"]
bearer_token = "secret"

[filter]
blocked_phrases = ["buy followers"]
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.agent.chat_history, 50);
    assert_eq!(config.agent.login_command, "!login");
    assert_eq!(config.bus.tts_capacity, 5);
    assert_eq!(config.bus.playback_capacity, 30);
    assert_eq!(config.bus.aggregator_capacity, 256);
    assert_eq!(config.tts.default_voice, "female_01.wav");
    assert_eq!(config.tts.narrator_voice, "bg3_narrator.wav");
    assert_eq!(
        config.tts.stop_command.as_deref(),
        Some("ssh gpu kill {handle}")
    );
    assert_eq!(config.audio.player_command, vec!["paplay", "--raw"]);
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("secret"));
    assert_eq!(config.filter.blocked_phrases, vec!["buy followers"]);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_and_validate_str("").expect("defaults validate");
    assert_eq!(config.gateway.port, 3447);
    assert!(config.tts.enabled);
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let toml = r#"
[tts]
defualt_voice = "x.wav"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert!(key.ends_with("defualt_voice"), "got key {key}");
            assert_eq!(suggestion.as_deref(), Some("default_voice"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[obs]\nurl = \"ws://x\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n").unwrap_err();
    assert!(
        matches!(&errors[0], ConfigError::InvalidType { key, .. } if key.ends_with("port")),
        "got {errors:?}"
    );
}

#[test]
fn validation_runs_after_parse() {
    let errors = load_and_validate_str("[bus]\ntts_capacity = 0\n").unwrap_err();
    assert!(matches!(
        &errors[0],
        ConfigError::Validation { key, .. } if key == "bus.tts_capacity"
    ));
}

#[test]
fn unknown_key_in_file_carries_source_span() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streambot.toml");
    std::fs::write(&path, "[gateway]\nprot = 1\n").unwrap();
    let errors = load_and_validate_path(&path).unwrap_err();
    match &errors[0] {
        ConfigError::UnknownKey {
            suggestion, span, ..
        } => {
            assert_eq!(suggestion.as_deref(), Some("port"));
            assert!(span.is_some());
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}
