// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shutdown on SIGINT/SIGTERM.
//!
//! Tasks run for the life of the process and are not cancelled one by one.
//! The binary waits on the returned token, flushes the account and mute
//! tables, and exits.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use streambot_storage::MutedSet;

use crate::identity::IdentityRegistry;

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), shutting down"),
                        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, shutting down");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Writes the account and mute tables one last time.
pub async fn persist_state(registry: &IdentityRegistry, muted: &MutedSet) {
    if let Err(e) = registry.save().await {
        warn!(error = %e, "failed to save accounts on shutdown");
    }
    if let Err(e) = muted.save().await {
        warn!(error = %e, "failed to save mute list on shutdown");
    }
    info!("state saved");
}
