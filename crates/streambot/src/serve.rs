// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `streambot serve` command implementation.
//!
//! Builds the message bus, spawns one task per component (aggregator, TTS
//! pipeline, audio player, platform connectors) and serves the gateway until
//! a shutdown signal arrives. Command queues without an in-process consumer
//! are offered to bridges on the gateway. State tables are written once more
//! on exit.

use std::path::Path;
use std::sync::Arc;

use streambot_agent::{
    Aggregator, IdentityRegistry, PhraseFilter, PlatformMultiplexer, install_signal_handler,
    persist_state,
};
use streambot_audio::{AudioPlayer, ProcessAudioFactory};
use streambot_bus::MessageBus;
use streambot_config::model::{GatewayConfig, StreambotConfig};
use streambot_core::{Broadcaster, StreambotError};
use streambot_gateway::{BridgeOutbox, GatewayState, WebsocketHub, start_server, watch_static};
use streambot_storage::{AccountStore, MutedSet};
use streambot_tts::{AllTalkClient, ShellLauncher, TtsPipeline};
use tracing::{debug, error, info, warn};

/// Secret file holding the ingest API token.
const GATEWAY_TOKEN_SECRET: &str = "gateway_token.txt";

/// Runs the `streambot serve` command.
pub async fn run_serve(config: StreambotConfig) -> Result<(), StreambotError> {
    init_tracing(&config.agent.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting streambot serve");

    let data_dir = config.agent.data_dir.clone();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .map_err(StreambotError::storage)?;

    let (bus, receivers) = MessageBus::new(&config.bus);
    let muted = Arc::new(MutedSet::load(&data_dir).await);
    let registry = Arc::new(IdentityRegistry::load(AccountStore::in_dir(&data_dir)).await?);
    let hub = Arc::new(WebsocketHub::new(config.gateway.client_buffer));
    let broadcaster: Arc<dyn Broadcaster> = hub.clone();

    // Aggregator.
    let mut aggregator = Aggregator::new(
        &config.agent,
        bus.clone(),
        broadcaster.clone(),
        registry.clone(),
    );
    let filter = PhraseFilter::new(&config.filter.blocked_phrases);
    if filter.is_empty() {
        debug!("content filter disabled");
    } else {
        info!(
            phrases = config.filter.blocked_phrases.len(),
            "content filter enabled"
        );
        aggregator = aggregator.with_filter(Arc::new(filter));
    }
    aggregator.load_history().await;
    tokio::spawn(aggregator.run(receivers.aggregator));

    // TTS pipeline. Without it the TTS queue is closed and producers see drops.
    if config.tts.enabled {
        let client = AllTalkClient::new(&config.tts)?;
        let mut pipeline = TtsPipeline::new(
            config.tts.clone(),
            Arc::new(client),
            bus.clone(),
            broadcaster.clone(),
            registry.clone(),
            muted.clone(),
        );
        if config.tts.start_command.is_some() {
            let launcher = ShellLauncher::new(config.tts.stop_command.clone());
            pipeline = pipeline.with_launcher(Arc::new(launcher));
            info!("remote TTS launcher enabled");
        }
        info!(base_url = config.tts.base_url.as_str(), "tts pipeline enabled");
        tokio::spawn(pipeline.run(receivers.tts));
    } else {
        info!("tts pipeline disabled by configuration");
        drop(receivers.tts);
    }

    // Audio player.
    let factory = ProcessAudioFactory::new(config.audio.player_command.clone());
    let player = AudioPlayer::new(
        &config.audio,
        Arc::new(factory),
        bus.signals().mic.clone(),
        muted.clone(),
    );
    tokio::spawn(player.run(receivers.playback));

    // Platform connectors. Chat from out-of-process bridges arrives through
    // the ingest endpoint, and their commands leave through the outbox.
    let mux = PlatformMultiplexer::new();
    if mux.is_empty() {
        info!("no platform adapters compiled in, relying on bridges");
    }
    let connectors = mux.spawn(&bus, receivers.platforms);
    // No OBS controller is built in; a bridge reports mic and scene and
    // executes scene switches.
    let outbox = BridgeOutbox::new()
        .with_platforms(connectors.unclaimed)
        .with_obs(receivers.obs);
    info!(feeds = ?outbox.feeds(), "bridge command feeds ready");

    // Static reload watcher; dropping it stops watching.
    let _watcher = if config.gateway.watch_static {
        match watch_static(&config.gateway.static_dir, broadcaster.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(error = %e, "static reload disabled");
                None
            }
        }
    } else {
        debug!("static reload disabled by configuration");
        None
    };

    // Gateway.
    let token = gateway_token(&config.gateway, &config.agent.secrets_dir);
    if token.is_none() {
        info!("no gateway token configured, ingest endpoint rejects all requests");
    }
    let state = GatewayState::new(
        &config.gateway,
        hub,
        bus,
        registry.clone(),
        muted.clone(),
        token,
    )?
    .with_outbox(outbox);
    let gateway_config = config.gateway.clone();
    let mut server = tokio::spawn(async move { start_server(&gateway_config, state).await });

    let cancel = install_signal_handler();
    let result = tokio::select! {
        _ = cancel.cancelled() => Ok(()),
        joined = &mut server => match joined {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = %e, "gateway stopped");
                Err(e)
            }
            Err(e) => Err(StreambotError::Internal(format!("gateway task failed: {e}"))),
        },
    };
    server.abort();

    persist_state(&registry, &muted).await;
    info!("streambot serve shutdown complete");
    result
}

/// Configured token, else the `gateway_token.txt` secret.
fn gateway_token(config: &GatewayConfig, secrets_dir: &Path) -> Option<String> {
    config
        .bearer_token
        .clone()
        .or_else(|| streambot_config::read_optional_secret(secrets_dir, GATEWAY_TOKEN_SECRET))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("streambot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
