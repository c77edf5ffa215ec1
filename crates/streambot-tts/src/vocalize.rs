// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text normalization before synthesis.
//!
//! Text inside double quotes is spoken in the character voice; text between
//! asterisks is spoken by the narrator.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());
static ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:url|gpt|tts|dns|http|ftp)\b").unwrap());

/// Spoken in place of a URL: the narrator reads it between character quotes.
const URL_SPOKEN: &str = "\" * U-R-L * \"";

/// Strips markup, replaces URLs and spells out acronyms.
///
/// A trailing ` .` is appended; the backend mispronounces very short
/// phrases without it.
pub fn vocalize_html(text: &str) -> String {
    let stripped = decode_entities(&HTML_TAG.replace_all(text, ""));
    let spoken = URL.replace_all(&stripped, URL_SPOKEN);
    let mut message = ACRONYM
        .replace_all(&spoken, |caps: &Captures<'_>| spell_out(&caps[0]))
        .into_owned();
    message.push_str(" .");
    message
}

fn spell_out(word: &str) -> String {
    word.chars()
        .map(|c| c.to_ascii_uppercase().to_string())
        .collect::<Vec<_>>()
        .join("-")
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Wraps a chat message, naming the speaker only when it changed.
pub fn chat_prompt(author: &str, message: &str, same_speaker: bool) -> String {
    if same_speaker {
        format!("\"{message}\"")
    } else {
        format!("* {author} says: * \" {message} \"")
    }
}

/// Alerts are read entirely by the narrator.
pub fn alert_prompt(message: &str) -> String {
    format!("* {message} *")
}

/// Remembers the last speaker so consecutive messages skip the prefix.
#[derive(Debug, Default)]
pub struct SpeakerTracker {
    last: Option<String>,
}

impl SpeakerTracker {
    /// Records `author_key` as the current speaker and returns whether it
    /// was already the previous one.
    pub fn same_speaker(&mut self, author_key: &str) -> bool {
        if self.last.as_deref() == Some(author_key) {
            true
        } else {
            self.last = Some(author_key.to_string());
            false
        }
    }
}
