// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account table persisted as a whole-file JSON snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use streambot_core::{Account, StreambotError};

use crate::fs;

/// File name of the account table inside the data directory.
pub const ACCOUNTS_FILE: &str = "users.json";

/// Everything the identity registry persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// SHA-256 hex digest of a password to the id of its account.
    #[serde(default)]
    pub passwords: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(ACCOUNTS_FILE))
    }

    /// Reads the snapshot; a missing file is an empty table.
    pub async fn load(&self) -> Result<AccountSnapshot, StreambotError> {
        match fs::read_optional(&self.path).await? {
            None => Ok(AccountSnapshot::default()),
            Some(content) => serde_json::from_str(&content).map_err(StreambotError::storage),
        }
    }

    /// Replaces the file with `snapshot`.
    pub async fn save(&self, snapshot: &AccountSnapshot) -> Result<(), StreambotError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(StreambotError::storage)?;
        fs::write_atomic(&self.path, &json).await
    }
}
