// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handler for the unlock relay.
//!
//! A single catch-all route serves every path and method. The pipeline
//! order is fixed: rate limit, identifier validation, method dispatch,
//! upstream relay, response. All responses are plain text; upstream
//! diagnostic bodies stay in the server-side log.

use crate::catalog::ItemCatalog;
use crate::classifier::classify;
use crate::config::Config;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::relay::{RelayClient, RelayError};
use crate::validator::{ValidationResult, XPlatformIdValidator};
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderName, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub validator: XPlatformIdValidator,
    pub relay: RelayClient,
    pub catalog: ItemCatalog,
    pub config: Config,
}

/// Build the application router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(relay_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Relay a request to the upstream profile service.
///
/// The path, stripped of its leading slash, is the candidate XPlatformId.
pub async fn relay_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
) -> Response {
    let client = addr.ip();
    let path = uri.path();

    if let RateLimitResult::Limited { retry_after } = state.limiter.check(client).await {
        let retry_secs = retry_after.as_secs_f64();
        info!(
            client = %client,
            method = %method,
            path = %path,
            status = 429,
            retry_after_secs = retry_secs,
            "rate limit exceeded"
        );
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [
                (header::CONTENT_TYPE, "text/plain".to_string()),
                (header::RETRY_AFTER, retry_secs.to_string()),
                (
                    HeaderName::from_static("x-ratelimit-limit"),
                    state.config.rate_limit.window_secs().to_string(),
                ),
                (
                    HeaderName::from_static("x-ratelimit-remaining"),
                    retry_secs.to_string(),
                ),
            ],
            "Rate limit exceeded",
        )
            .into_response();
    }

    let id = path.trim_start_matches('/');
    if let ValidationResult::Invalid(err) = state.validator.validate(id) {
        info!(
            client = %client,
            method = %method,
            path = %path,
            status = 400,
            error = %err,
            "invalid XPlatformId"
        );
        return plain(StatusCode::BAD_REQUEST, "Invalid XPlatformId");
    }

    if method == Method::GET {
        match state.relay.fetch_unlocks(id).await {
            Ok(unlocks) => {
                let status = classify(unlocks.as_ref(), &state.catalog);
                info!(
                    client = %client,
                    method = %method,
                    path = %path,
                    status = 200,
                    unlock_status = %status,
                    "profile fetched"
                );
                plain(StatusCode::OK, status.as_str())
            }
            Err(err) => relay_failure(client, &method, path, &err),
        }
    } else if method == Method::POST {
        match state.relay.push_unlock_all(id, &state.catalog).await {
            Ok(()) => {
                info!(
                    client = %client,
                    method = %method,
                    path = %path,
                    status = 200,
                    items = state.catalog.len(),
                    "unlock-all pushed"
                );
                plain(StatusCode::OK, "OK")
            }
            Err(err) => relay_failure(client, &method, path, &err),
        }
    } else {
        info!(
            client = %client,
            method = %method,
            path = %path,
            status = 405,
            "method not allowed"
        );
        plain(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

/// Translate an upstream failure into the client-visible response, keeping
/// upstream detail in the log only.
fn relay_failure(client: IpAddr, method: &Method, path: &str, err: &RelayError) -> Response {
    match err {
        RelayError::NotFound => {
            info!(
                client = %client,
                method = %method,
                path = %path,
                status = 404,
                "account not found upstream"
            );
            plain(StatusCode::NOT_FOUND, "Not found")
        }
        RelayError::UpstreamStatus { status, body } => {
            error!(
                client = %client,
                method = %method,
                path = %path,
                status = 500,
                upstream_status = %status,
                upstream_body = %body,
                "upstream error"
            );
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        other => {
            error!(
                client = %client,
                method = %method,
                path = %path,
                status = 500,
                error = %other,
                "upstream request failed"
            );
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn plain(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}
