// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat-file persistence for streambot.
//!
//! The chat log and counter are written only by the aggregator; the account
//! table only by the identity registry. The mute list is shared and
//! serializes its own rewrites.

pub mod accounts;
pub mod chat_log;
pub mod counter;
pub mod fs;
pub mod muted;

pub use accounts::{AccountSnapshot, AccountStore};
pub use chat_log::ChatLog;
pub use counter::SequenceCounter;
pub use muted::MutedSet;
