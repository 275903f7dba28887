// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local registration/token server implementing the Keyward auth API.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod state;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::DevConfig;
use crate::state::DevState;

/// Build the axum `Router` with all devserver routes.
pub fn build_router(state: Arc<DevState>) -> Router {
    let protected = Router::new()
        .route("/api/v1/me", get(http::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer));

    Router::new()
        .route("/api/v1/health", get(http::health))
        // Registration and client-credentials grant
        .route("/apps/register", get(http::register))
        .route("/apps/token", post(http::token))
        // Test hooks
        .route("/dev/revoke", post(http::revoke))
        .route("/dev/stats", get(http::stats))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until `shutdown` fires.
pub async fn run(config: DevConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, config, shutdown).await
}

/// Serve on an already-bound listener until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    config: DevConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    tracing::info!(token_ttl_secs = config.token_ttl_secs, "keyward-devserver listening on {local}");
    let router = build_router(Arc::new(DevState::new(config)));
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;
    Ok(())
}
