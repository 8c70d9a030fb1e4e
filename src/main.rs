// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Unlock Status Relay Service
//!
//! A single-endpoint HTTP relay in front of the Echo Relay profile
//! service. `GET /<XPlatformId>` reports the account's unlock state as
//! `locked`, `corrupted` or `unlocked`; `POST /<XPlatformId>` unlocks the
//! full item catalog. Every request passes a per-client fixed-window rate
//! limit and identifier validation before the upstream call.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:3000)
//! - `ECHO_RELAY_ENDPOINT`: Upstream base URL (default: http://127.0.0.1:8080/)
//! - `ECHO_RELAY_API_KEY`: Shared secret sent as X-Api-Key (default: empty)
//! - `RATE_LIMIT_WINDOW_MS`: Admission window per client (default: 1000)
//! - `RATE_LIMIT_MAX_ENTRIES`: Inline purge threshold (default: 65536)
//! - `RATE_LIMIT_SWEEP_SECS`: Background sweep interval (default: 60)
//! - `UPSTREAM_TIMEOUT_MS`: Upstream request timeout (default: 10000)
//! - `PLATFORMS`: Comma-separated platform allow-list (default: DMO,OVR-ORG)
//! - `ALLOW_SIGNED_ACCOUNT_IDS`: Accept signed account ids (default: false)
//! - `ITEMS_PATH`: Flat JSON item catalog (default: items.json)
//! - `ITEM_ASSIGNMENT_PATH`: Nested assignment document used when the flat
//!   catalog file is absent

use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use unlock_relay::{
    catalog::ItemCatalog,
    config::{CatalogConfig, Config},
    handlers::{router, AppState},
    limiter::RateLimiter,
    relay::RelayClient,
    validator::XPlatformIdValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration and the item catalog
    let config = load_config();
    let catalog = load_catalog(&config.catalog)?;
    info!(
        bind_addr = %config.bind_addr,
        upstream = %config.upstream.endpoint,
        window_ms = config.rate_limit.window_ms,
        platforms = ?config.validation.platforms,
        items = catalog.len(),
        "Starting unlock relay"
    );

    // Create application state
    let limiter = RateLimiter::new(config.rate_limit.clone());
    let validator = XPlatformIdValidator::new(config.validation.clone());
    let relay = RelayClient::new(&config.upstream)
        .context("failed to construct upstream relay client")?;

    let state = Arc::new(AppState {
        limiter,
        validator,
        relay,
        catalog,
        config: config.clone(),
    });

    // Spawn limiter sweep task
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_state.config.rate_limit.sweep_interval());
        loop {
            interval.tick().await;
            sweep_state.limiter.sweep().await;
        }
    });

    // Build router
    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        rate_limit: unlock_relay::config::RateLimitConfig {
            window_ms: std::env::var("RATE_LIMIT_WINDOW_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            max_entries: std::env::var("RATE_LIMIT_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(65536),
            sweep_interval_secs: std::env::var("RATE_LIMIT_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        },
        validation: unlock_relay::config::ValidationConfig {
            platforms: std::env::var("PLATFORMS")
                .map(|v| {
                    v.split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| vec!["DMO".to_string(), "OVR-ORG".to_string()]),
            allow_signed_account_ids: std::env::var("ALLOW_SIGNED_ACCOUNT_IDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        },
        upstream: unlock_relay::config::UpstreamConfig {
            endpoint: std::env::var("ECHO_RELAY_ENDPOINT")
                .unwrap_or_else(|_| "http://127.0.0.1:8080/".to_string()),
            api_key: std::env::var("ECHO_RELAY_API_KEY").unwrap_or_default(),
            timeout_ms: std::env::var("UPSTREAM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10000),
        },
        catalog: CatalogConfig {
            items_path: std::env::var("ITEMS_PATH").unwrap_or_else(|_| "items.json".to_string()),
            assignment_path: std::env::var("ITEM_ASSIGNMENT_PATH").ok(),
        },
    }
}

/// Load the item catalog: the flat items file when present, otherwise the
/// assignment document fallback.
fn load_catalog(config: &CatalogConfig) -> anyhow::Result<ItemCatalog> {
    if Path::new(&config.items_path).exists() {
        return ItemCatalog::from_items_file(&config.items_path)
            .with_context(|| format!("failed to load item catalog from {}", config.items_path));
    }

    if let Some(assignment_path) = &config.assignment_path {
        return ItemCatalog::from_assignment_file(assignment_path).with_context(|| {
            format!("failed to derive item catalog from {assignment_path}")
        });
    }

    bail!(
        "item catalog not found at {} and no ITEM_ASSIGNMENT_PATH fallback set",
        config.items_path
    )
}
