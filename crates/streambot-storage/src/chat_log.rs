// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only chat log, one JSON entry per line.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use streambot_core::{ChatEntry, StreambotError};
use tracing::warn;

use crate::fs;

/// File name of the chat log inside the data directory.
pub const CHAT_LOG_FILE: &str = "chat_log.txt";

#[derive(Debug, Clone)]
pub struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CHAT_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, entry: &ChatEntry) -> Result<(), StreambotError> {
        let line = serde_json::to_string(entry).map_err(StreambotError::storage)?;
        fs::append_line(&self.path, &line).await
    }

    /// The last `n` parseable entries, oldest first. Malformed lines are
    /// logged and skipped; a missing log is empty.
    pub async fn read_last(&self, n: usize) -> Result<Vec<ChatEntry>, StreambotError> {
        let Some(content) = fs::read_optional(&self.path).await? else {
            return Ok(Vec::new());
        };
        let mut ring = VecDeque::with_capacity(n + 1);
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ChatEntry>(line) {
                Ok(entry) => {
                    ring.push_back(entry);
                    if ring.len() > n {
                        ring.pop_front();
                    }
                }
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = lineno + 1,
                    error = %e,
                    "skipping unparseable chat log line"
                ),
            }
        }
        Ok(ring.into())
    }
}
