// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The set of muted authors, persisted one User JSON per line.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use streambot_core::{StreambotError, User};
use tokio::sync::Mutex;
use tracing::warn;

use crate::fs;

/// File name of the mute list inside the data directory.
pub const MUTED_FILE: &str = "muted.txt";

/// Concurrent mute set keyed by [`User::key`].
///
/// Reads are lock-free; saves are serialized so two toggles never interleave
/// their rewrites.
#[derive(Debug)]
pub struct MutedSet {
    path: PathBuf,
    users: DashMap<String, User>,
    save_lock: Mutex<()>,
}

impl MutedSet {
    /// An empty set persisted at `path`, without reading it.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            users: DashMap::new(),
            save_lock: Mutex::new(()),
        }
    }

    /// Loads the mute list from `dir`. A missing or unreadable file yields an
    /// empty set; malformed lines are skipped.
    pub async fn load(dir: &Path) -> Self {
        let set = Self::empty(dir.join(MUTED_FILE));
        match fs::read_optional(&set.path).await {
            Ok(Some(content)) => {
                for line in content.lines().filter(|l| !l.trim().is_empty()) {
                    match serde_json::from_str::<User>(line) {
                        Ok(user) => {
                            set.users.insert(user.key(), user);
                        }
                        Err(e) => warn!(error = %e, "skipping unparseable muted user"),
                    }
                }
            }
            Ok(None) => {}
            Err(e) => warn!(path = %set.path.display(), error = %e, "couldn't read mute list"),
        }
        set
    }

    pub fn is_muted(&self, user: &User) -> bool {
        self.users.contains_key(&user.key())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Flips membership of `user` and returns whether it is now muted.
    /// The file is not touched; call [`save`](Self::save) afterwards.
    pub fn toggle(&self, user: &User) -> bool {
        let key = user.key();
        if self.users.remove(&key).is_some() {
            false
        } else {
            self.users.insert(key, user.clone());
            true
        }
    }

    /// Rewrites the whole file from the in-memory set.
    pub async fn save(&self) -> Result<(), StreambotError> {
        let _guard = self.save_lock.lock().await;
        let mut lines: Vec<String> = Vec::with_capacity(self.users.len());
        for entry in self.users.iter() {
            lines.push(serde_json::to_string(entry.value()).map_err(StreambotError::storage)?);
        }
        lines.sort();
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write_atomic(&self.path, content.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streambot_core::types::{DiscordUser, TwitchUser};

    fn alice() -> User {
        User::Twitch(TwitchUser {
            id: "1".into(),
            login: "alice".into(),
            name: "Alice".into(),
            color: None,
        })
    }

    #[tokio::test]
    async fn toggle_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let set = MutedSet::load(dir.path()).await;
        assert!(set.is_empty());

        assert!(set.toggle(&alice()));
        set.save().await.unwrap();
        assert!(set.is_muted(&alice()));

        let reloaded = MutedSet::load(dir.path()).await;
        assert!(reloaded.is_muted(&alice()));
        assert_eq!(reloaded.len(), 1);

        assert!(!reloaded.toggle(&alice()));
        reloaded.save().await.unwrap();
        let content = std::fs::read_to_string(dir.path().join(MUTED_FILE)).unwrap();
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn file_holds_one_user_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let set = MutedSet::load(dir.path()).await;
        set.toggle(&alice());
        set.toggle(&User::Discord(DiscordUser {
            id: "9".into(),
            username: "bob".into(),
            avatar: None,
        }));
        set.save().await.unwrap();

        let content = std::fs::read_to_string(dir.path().join(MUTED_FILE)).unwrap();
        let users: Vec<User> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn garbage_lines_do_not_prevent_loading() {
        let dir = tempfile::tempdir().unwrap();
        let good = serde_json::to_string(&alice()).unwrap();
        std::fs::write(dir.path().join(MUTED_FILE), format!("garbage\n{good}\n")).unwrap();
        let set = MutedSet::load(dir.path()).await;
        assert!(set.is_muted(&alice()));
    }
}
