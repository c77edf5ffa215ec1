// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns inbound platform chat into a [`ChatEntry`] with its three
//! projections.
//!
//! Attachment precedence: native attachments win. When a message carries
//! any, they are rendered and URLs in the text stay plain text. Otherwise
//! image URLs found in the text are embedded.

use std::sync::LazyLock;

use regex::Regex;
use streambot_core::html::escape_html;
use streambot_core::{ChatEntry, InboundChat};

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhttps?://[^\s<>"']+\.(?:png|jpe?g|gif|webp)(?:\?[^\s<>"']*)?"#).unwrap()
});

/// Renders an inbound message. `tts_text` is the raw text; vocalization
/// happens in the TTS pipeline.
pub fn render_inbound(chat: &InboundChat) -> ChatEntry {
    let (attachment_html, attachment_text) = render_attachments(chat);

    let html = format!(
        "{} {}: {}{}",
        chat.platform.icon(),
        chat.author.render_html(),
        escape_html(&chat.text),
        attachment_html
    );
    let terminal = format!(
        "{}: {}{}",
        chat.author.display_name(),
        chat.text,
        attachment_text
    );

    let mut entry = ChatEntry::new(chat.author.clone(), chat.text.clone())
        .with_html(html)
        .with_terminal(terminal)
        .with_tts(chat.text.trim());
    if let Some(id) = &chat.message_id {
        entry = entry.with_message_id(chat.platform, id.clone());
    }
    entry
}

fn render_attachments(chat: &InboundChat) -> (String, String) {
    let mut html = String::new();
    let mut text = String::new();

    if !chat.attachments.is_empty() {
        for attachment in &chat.attachments {
            let url = escape_html(&attachment.url);
            if attachment.is_image() {
                html.push_str(&format!(r#"<img src="{url}" class="attachment">"#));
            } else {
                html.push_str(&format!(
                    r#"<a href="{url}" class="attachment">{}</a>"#,
                    escape_html(&attachment.filename)
                ));
            }
            text.push_str(&format!(" [attachment {}]", attachment.filename));
        }
        return (html, text);
    }

    for found in IMAGE_URL.find_iter(&chat.text) {
        html.push_str(&format!(
            r#"<img src="{}" class="attachment">"#,
            escape_html(found.as_str())
        ));
    }
    (html, text)
}
