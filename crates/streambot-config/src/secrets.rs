// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-secret-per-file credentials under the secrets directory.

use std::path::Path;

use crate::diagnostic::ConfigError;

/// Reads `dir/name` and trims surrounding whitespace.
pub fn read_secret(dir: &Path, name: &str) -> Result<String, ConfigError> {
    let path = dir.join(name);
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Secret {
        name: name.to_string(),
        reason: format!("{}: {e}", path.display()),
    })?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Secret {
            name: name.to_string(),
            reason: format!("{} is empty", path.display()),
        });
    }
    Ok(trimmed.to_string())
}

/// Like [`read_secret`] but treats a missing or empty file as `None`.
pub fn read_optional_secret(dir: &Path, name: &str) -> Option<String> {
    match read_secret(dir, name) {
        Ok(secret) => Some(secret),
        Err(e) => {
            tracing::debug!(secret = name, error = %e, "optional secret not available");
            None
        }
    }
}
