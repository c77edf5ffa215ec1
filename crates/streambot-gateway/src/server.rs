// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Routes:
//! - `GET /health`: public liveness probe
//! - `GET /ws`: overlay and control-panel websocket
//! - `POST /v1/chat`, `POST /v1/now-playing`: bearer-authenticated ingest
//! - `POST /v1/mic`, `POST /v1/scene`: OBS state reported by a bridge
//! - `GET /v1/commands/{feed}`: long-poll of queued platform or OBS commands
//! - everything else: files from the static directory, `/` being `chat.html`

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use streambot_agent::{IdentityRegistry, render_inbound};
use streambot_bus::{AggregatorMessage, MessageBus};
use streambot_config::model::GatewayConfig;
use streambot_core::{InboundChat, Platform, StreambotError};
use streambot_storage::MutedSet;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::auth::{AdminPolicy, AuthConfig, auth_middleware};
use crate::bridge::{BridgeOutbox, OBS_FEED};
use crate::commands::CommandHandler;
use crate::hub::WebsocketHub;
use crate::ws;

/// Page served at `/`.
pub const INDEX_PAGE: &str = "chat.html";
/// Command poll wait when the bridge does not pass `wait_ms`.
pub const DEFAULT_POLL_WAIT_MS: u64 = 20_000;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub hub: Arc<WebsocketHub>,
    pub bus: MessageBus,
    pub registry: Arc<IdentityRegistry>,
    pub commands: Arc<CommandHandler>,
    pub admin: Arc<AdminPolicy>,
    pub auth: AuthConfig,
    pub max_message_size: usize,
    pub outbox: Arc<BridgeOutbox>,
}

impl GatewayState {
    /// `bearer_token` overrides `config.bearer_token` when set.
    pub fn new(
        config: &GatewayConfig,
        hub: Arc<WebsocketHub>,
        bus: MessageBus,
        registry: Arc<IdentityRegistry>,
        muted: Arc<MutedSet>,
        bearer_token: Option<String>,
    ) -> Result<Self, StreambotError> {
        let admin = AdminPolicy::from_config(&config.admin_addresses)?;
        let commands = CommandHandler::new(bus.clone(), hub.clone(), registry.clone(), muted);
        Ok(Self {
            hub,
            bus,
            registry,
            commands: Arc::new(commands),
            admin: Arc::new(admin),
            auth: AuthConfig {
                bearer_token: bearer_token.or_else(|| config.bearer_token.clone()),
            },
            max_message_size: config.max_message_size,
            outbox: Arc::new(BridgeOutbox::new()),
        })
    }

    /// Offers `outbox` on the command feed endpoint.
    pub fn with_outbox(mut self, outbox: BridgeOutbox) -> Self {
        self.outbox = Arc::new(outbox);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub clients: usize,
    pub mic_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of `POST /v1/now-playing`.
#[derive(Debug, Deserialize)]
pub struct NowPlayingRequest {
    pub text: String,
}

/// Body of `POST /v1/mic`.
#[derive(Debug, Deserialize)]
pub struct MicRequest {
    pub active: bool,
}

/// Body of `POST /v1/scene`; `null` means OBS is disconnected.
#[derive(Debug, Deserialize)]
pub struct SceneRequest {
    pub scene: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PollParams {
    pub wait_ms: Option<u64>,
}

async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let signals = state.bus.signals();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        clients: state.hub.len(),
        mic_active: signals.mic.is_active(),
        scene: signals.scene.get().map(|scene| scene.to_string()),
    })
}

fn unavailable(e: StreambotError) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

/// Renders a chat message from an out-of-process bridge and queues it.
async fn post_chat(State(state): State<GatewayState>, Json(chat): Json<InboundChat>) -> Response {
    let entry = render_inbound(&chat);
    match state.bus.enqueue_chat(entry).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => unavailable(e),
    }
}

async fn post_now_playing(
    State(state): State<GatewayState>,
    Json(body): Json<NowPlayingRequest>,
) -> Response {
    match state
        .bus
        .aggregator(AggregatorMessage::AudioMessage(body.text))
        .await
    {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => unavailable(e),
    }
}

async fn post_mic(State(state): State<GatewayState>, Json(body): Json<MicRequest>) -> StatusCode {
    let was = state.bus.signals().mic.set_active(body.active);
    if was != body.active {
        debug!(active = body.active, "mic state changed");
    }
    StatusCode::NO_CONTENT
}

async fn post_scene(State(state): State<GatewayState>, Json(body): Json<SceneRequest>) -> StatusCode {
    let scene = &state.bus.signals().scene;
    match body.scene {
        Some(name) => {
            info!(scene = %name, "scene reported by bridge");
            scene.set(name);
        }
        None => scene.clear(),
    }
    StatusCode::NO_CONTENT
}

/// Hands queued commands for `feed` to a bridge, waiting up to `wait_ms`.
async fn get_commands(
    State(state): State<GatewayState>,
    Path(feed): Path<String>,
    Query(params): Query<PollParams>,
) -> Response {
    let wait = Duration::from_millis(params.wait_ms.unwrap_or(DEFAULT_POLL_WAIT_MS));
    let polled = if feed == OBS_FEED {
        state
            .outbox
            .poll_obs(wait)
            .await
            .map(|batch| Json(batch).into_response())
    } else {
        match Platform::from_str(&feed) {
            Ok(platform) => state
                .outbox
                .poll_platform(platform, wait)
                .await
                .map(|batch| Json(batch).into_response()),
            Err(_) => None,
        }
    };
    polled.unwrap_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no command feed named {feed}"),
            }),
        )
            .into_response()
    })
}

/// Builds the router; `static_dir` backs the fallback file service.
pub fn router(state: GatewayState, config: &GatewayConfig) -> Router {
    let api_routes = Router::new()
        .route("/v1/chat", post(post_chat))
        .route("/v1/now-playing", post(post_now_playing))
        .route("/v1/mic", post(post_mic))
        .route("/v1/scene", post(post_scene))
        .route("/v1/commands/{feed}", get(get_commands))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(get_health))
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    let index = ServeFile::new(config.static_dir.join(INDEX_PAGE));
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .route_service("/", index)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves `app` on an already bound listener until the server fails.
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), StreambotError> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| StreambotError::Internal(format!("gateway server error: {e}")))
}

/// Binds `host:port` from `config` and serves the gateway.
pub async fn start_server(config: &GatewayConfig, state: GatewayState) -> Result<(), StreambotError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| StreambotError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;
    info!(%addr, "gateway listening");
    serve(listener, router(state, config)).await
}
