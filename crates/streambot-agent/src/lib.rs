// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat side of streambot.
//!
//! - [`Aggregator`] owns chat history, the persisted log and the sequence
//!   counter, and fans entries out to the web hub and the TTS queue
//! - [`IdentityRegistry`] links platform identities to accounts
//! - [`PlatformMultiplexer`] runs one reconnecting connector per platform
//! - [`ObsConnector`] tracks the scene and microphone activity

pub mod aggregator;
pub mod connector;
pub mod filter;
pub mod identity;
pub mod multiplexer;
pub mod obs;
pub mod render;
pub mod shutdown;

pub use aggregator::Aggregator;
pub use connector::PlatformConnector;
pub use filter::{ContentFilter, PhraseFilter};
pub use identity::IdentityRegistry;
pub use multiplexer::{PlatformMultiplexer, PlatformTasks};
pub use obs::{MicActivityTracker, ObsConnector};
pub use render::render_inbound;
pub use shutdown::{install_signal_handler, persist_state};
