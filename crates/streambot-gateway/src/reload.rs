// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tells web clients to reload when the overlay files change.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use streambot_core::{Broadcaster, StreambotError};
use tracing::{debug, info, warn};

/// Quiet period after the last change before `Reload` is sent.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches `dir` recursively and broadcasts `Reload()` once per burst of
/// changes. Watching stops when the returned debouncer is dropped.
pub fn watch_static(
    dir: &Path,
    broadcaster: Arc<dyn Broadcaster>,
) -> Result<Debouncer<RecommendedWatcher>, StreambotError> {
    let mut debouncer = new_debouncer(RELOAD_DEBOUNCE, move |result: DebounceEventResult| {
        match result {
            Ok(events) if !events.is_empty() => {
                debug!(changed = events.len(), "static files changed");
                broadcaster.broadcast("Reload", vec![]);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "static file watcher error"),
        }
    })
    .map_err(|e| StreambotError::Internal(format!("failed to create file watcher: {e}")))?;

    debouncer
        .watcher()
        .watch(dir, RecursiveMode::Recursive)
        .map_err(|e| {
            StreambotError::Internal(format!("failed to watch {}: {e}", dir.display()))
        })?;
    info!(dir = %dir.display(), "watching static files");
    Ok(debouncer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use streambot_test_utils::RecordingBroadcaster;

    #[tokio::test]
    async fn file_change_broadcasts_reload() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(RecordingBroadcaster::new());
        let _watcher = watch_static(dir.path(), recorder.clone()).unwrap();

        std::fs::write(dir.path().join("chat.css"), "body {}").unwrap();
        for _ in 0..100 {
            if !recorder.named("Reload").is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let reloads = recorder.named("Reload");
        assert!(!reloads.is_empty());
        assert!(reloads[0].args.is_empty());
        assert_eq!(reloads[0].client, None);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let recorder = Arc::new(RecordingBroadcaster::new());
        let result = watch_static(Path::new("/nonexistent/streambot-static"), recorder);
        assert!(result.is_err());
    }
}
