// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable content filter at the aggregator's ingestion boundary.

use streambot_core::ChatEntry;

/// Decides whether an entry may enter the chat pipeline.
///
/// Suppressed entries are deleted upstream and never logged, broadcast
/// or spoken.
pub trait ContentFilter: Send + Sync + 'static {
    /// Returns the reason for suppression, or `None` to accept.
    fn check(&self, entry: &ChatEntry) -> Option<String>;
}

/// Suppresses entries containing any configured phrase, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct PhraseFilter {
    phrases: Vec<String>,
}

impl PhraseFilter {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl ContentFilter for PhraseFilter {
    fn check(&self, entry: &ChatEntry) -> Option<String> {
        if entry.author.is_bot() {
            return None;
        }
        let text = entry.original_message.to_lowercase();
        self.phrases
            .iter()
            .find(|p| text.contains(p.as_str()))
            .map(|p| format!("blocked phrase `{p}`"))
    }
}
