// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent sequence counter holding the last assigned id as decimal text.

use std::path::{Path, PathBuf};

use streambot_core::StreambotError;

use crate::fs;

/// File name of the counter inside the data directory.
pub const COUNTER_FILE: &str = "chat_id.txt";

#[derive(Debug, Clone)]
pub struct SequenceCounter {
    path: PathBuf,
}

impl SequenceCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(COUNTER_FILE))
    }

    /// Last assigned id; 0 when the file does not exist yet.
    pub async fn current(&self) -> Result<u64, StreambotError> {
        match fs::read_optional(&self.path).await? {
            None => Ok(0),
            Some(text) => text.trim().parse::<u64>().map_err(StreambotError::storage),
        }
    }

    /// Reads the current value, persists its successor and returns it.
    pub async fn next(&self) -> Result<u64, StreambotError> {
        let next = self.current().await? + 1;
        tokio::fs::write(&self.path, next.to_string())
            .await
            .map_err(StreambotError::storage)?;
        Ok(next)
    }
}
