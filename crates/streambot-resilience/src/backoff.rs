// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry delay policy with quiet-window and success reset.
//!
//! A failure streak walks the delay table one step per attempt and stays on
//! its last entry. An attempt more than [`QUIET_WINDOW`] after the previous
//! one starts a new streak with no delay; [`Backoff::success`] does the same
//! for the next attempt.
//!
//! A `Backoff` is owned by exactly one retry loop and is not shared.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

/// Delays for consecutive attempts within one failure streak.
pub const DELAY_TABLE: [Duration; 7] = [
    Duration::from_secs(1),
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(300),
    Duration::from_secs(600),
];

/// Gap after which an attempt is treated as the start of a new streak.
pub const QUIET_WINDOW: Duration = Duration::from_secs(60);

/// Retry state for one loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    description: String,
    attempts: usize,
    /// `None` stands for "far past": the next attempt never waits.
    last_attempt: Option<Instant>,
}

impl Backoff {
    /// Creates a backoff labelled with `description` in log output.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attempts: 0,
            last_attempt: None,
        }
    }

    /// Attempts made in the current streak, capped at the table length.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Waits as required before the next try and returns the delay applied.
    ///
    /// Call once at the top of every loop iteration, before doing any work.
    pub async fn attempt(&mut self) -> Duration {
        let delay = self.next_delay(Instant::now());
        if !delay.is_zero() {
            warn!(
                backoff = %self.description,
                attempts = self.attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying after delay"
            );
            tokio::time::sleep(delay).await;
        }
        self.last_attempt = Some(Instant::now());
        delay
    }

    /// Marks the streak as recovered; the next [`attempt`](Self::attempt)
    /// returns immediately.
    pub fn success(&mut self) {
        if self.attempts > 0 {
            info!(
                backoff = %self.description,
                attempts = self.attempts,
                "recovered"
            );
        }
        self.attempts = 0;
        self.last_attempt = None;
    }

    /// Advances the streak state for an attempt at `now` and returns the
    /// delay to wait. Does not record the attempt time.
    fn next_delay(&mut self, now: Instant) -> Duration {
        let fresh = match self.last_attempt {
            None => true,
            Some(last) => now.saturating_duration_since(last) > QUIET_WINDOW,
        };
        if fresh {
            self.attempts = 0;
            return Duration::ZERO;
        }
        let delay = DELAY_TABLE[self.attempts.min(DELAY_TABLE.len() - 1)];
        self.attempts = (self.attempts + 1).min(DELAY_TABLE.len());
        delay
    }
}
