// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for streambot.
//!
//! Every loop that talks to something outside the process (platform chat,
//! OBS, the synthesis backend, the audio device) calls
//! [`Backoff::attempt`] at the top of each iteration and
//! [`Backoff::success`] once useful work has been confirmed.

pub mod backoff;

pub use backoff::{Backoff, DELAY_TABLE, QUIET_WINDOW};
