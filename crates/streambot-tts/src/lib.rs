// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-speech for streambot: the AllTalk HTTP client, text
//! normalization, the shell launcher for the backend and the pipeline that
//! turns queued chat and alerts into playback requests.

pub mod client;
pub mod launcher;
pub mod pipeline;
pub mod vocalize;

pub use client::AllTalkClient;
pub use launcher::ShellLauncher;
pub use pipeline::{PipelineState, TtsPipeline};
pub use vocalize::vocalize_html;
