// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File helpers shared by the stores.

use std::path::{Path, PathBuf};

use streambot_core::StreambotError;
use tokio::io::AsyncWriteExt;

/// Appends `line` plus a newline, creating the file if needed.
pub async fn append_line(path: &Path, line: &str) -> Result<(), StreambotError> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(StreambotError::storage)?;
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    file.write_all(buf.as_bytes())
        .await
        .map_err(StreambotError::storage)?;
    file.flush().await.map_err(StreambotError::storage)
}

/// Writes a full snapshot next to `path` and renames it into place, so
/// readers never observe a partial file.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StreambotError> {
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, contents)
        .await
        .map_err(StreambotError::storage)?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(StreambotError::storage)
}

/// Reads a file, mapping "not found" to `None`.
pub async fn read_optional(path: &Path) -> Result<Option<String>, StreambotError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StreambotError::storage(e)),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_creates_and_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append_line(&path, "one").await.unwrap();
        append_line(&path, "two").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[tokio::test]
    async fn atomic_write_replaces_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join("accounts.json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optional(&dir.path().join("nope")).await.unwrap().is_none());
    }
}
