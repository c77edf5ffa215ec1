// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for streambot.

use thiserror::Error;

/// The primary error type used across streambot crates and collaborator traits.
#[derive(Debug, Error)]
pub enum StreambotError {
    /// Configuration errors (invalid TOML, missing secrets, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence errors (chat log, counter file, mute file, account table).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Platform connector errors (connection failure, API call, malformed payload).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Synthesis backend errors (unreachable, non-200, undecodable audio).
    #[error("synthesis error: {message}")]
    Synthesis {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Audio device or waveform errors.
    #[error("audio error: {message}")]
    Audio {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The consumer side of a queue has gone away.
    #[error("queue closed: {queue}")]
    QueueClosed { queue: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StreambotError {
    /// Wraps an I/O or serialization failure as a storage error.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Builds a platform error without an underlying cause.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a synthesis error without an underlying cause.
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an audio error without an underlying cause.
    pub fn audio(message: impl Into<String>) -> Self {
        Self::Audio {
            message: message.into(),
            source: None,
        }
    }
}
