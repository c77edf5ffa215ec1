// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access control for the gateway.
//!
//! Web clients get the admin capability at handshake time when their address
//! is on the allow-list. Behind a reverse proxy the single `X-Forwarded-For`
//! header names the client; more than one such header is treated as forged.
//!
//! The ingest API uses a bearer token instead. Without a configured token
//! every API request is rejected.

use std::net::IpAddr;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use streambot_core::StreambotError;
use tracing::{debug, warn};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Addresses whose web clients may run mutating commands.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    addresses: Vec<IpAddr>,
}

impl AdminPolicy {
    pub fn new(addresses: Vec<IpAddr>) -> Self {
        Self { addresses }
    }

    /// Parses the configured address strings.
    pub fn from_config(addresses: &[String]) -> Result<Self, StreambotError> {
        let parsed = addresses
            .iter()
            .map(|a| {
                a.trim()
                    .parse::<IpAddr>()
                    .map_err(|e| StreambotError::Config(format!("invalid admin address {a:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(parsed))
    }

    fn allows(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.addresses.iter().any(|a| a.to_canonical() == ip)
    }

    /// Decides the admin flag for a connection from `peer`.
    pub fn is_admin(&self, peer: IpAddr, headers: &HeaderMap) -> bool {
        let forwarded: Vec<_> = headers.get_all(FORWARDED_FOR).iter().collect();
        match forwarded.as_slice() {
            [] => self.allows(peer),
            [value] => {
                let Some(ip) = value
                    .to_str()
                    .ok()
                    .and_then(|v| v.trim().parse::<IpAddr>().ok())
                else {
                    debug!(%peer, "unparseable X-Forwarded-For header");
                    return false;
                };
                debug!(%peer, client = %ip, "proxied connection");
                self.allows(ip)
            }
            many => {
                warn!(%peer, headers = many.len(), "multiple X-Forwarded-For headers, refusing admin");
                false
            }
        }
    }
}

/// Bearer token for the ingest API.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Rejects API requests without the configured bearer token (fail-closed).
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = auth.bearer_token.as_deref() else {
        debug!("ingest API has no token configured, rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    };
    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(expected) {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
