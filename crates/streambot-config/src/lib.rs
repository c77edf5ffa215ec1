// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for streambot.
//!
//! TOML parsing with `deny_unknown_fields`, a system/user/local file
//! hierarchy, `STREAMBOT_` environment overrides, and miette diagnostics
//! with typo suggestions.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod secrets;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::StreambotConfig;
pub use secrets::{read_optional_secret, read_secret};

/// Loads configuration from the file hierarchy and validates it.
pub fn load_and_validate() -> Result<StreambotConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Loads configuration from an explicit file and validates it.
pub fn load_and_validate_path(
    path: &std::path::Path,
) -> Result<StreambotConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Loads configuration from a TOML string and validates it.
pub fn load_and_validate_str(toml_content: &str) -> Result<StreambotConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Contents of every config file that exists, for error spans.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![
        std::path::PathBuf::from(loader::SYSTEM_CONFIG),
        std::path::PathBuf::from(loader::LOCAL_CONFIG),
    ];
    if let Some(user) = loader::user_config_path() {
        candidates.insert(1, user);
    }
    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let absolute = std::fs::canonicalize(&path).unwrap_or(path);
            Some((absolute.display().to_string(), content))
        })
        .collect()
}
