//! HTTP transport for container deployments.
//!
//! MCP Streamable HTTP lives under `/mcp` (sessions via `Mcp-Session-Id`),
//! `GET /` returns the server description and tool catalogue, and `/health`
//! reports liveness. Credentials may be passed per request as
//! `api_key`/`api_secret` query parameters.

use crate::auth::CredentialQuery;
use crate::dispatch::Dispatcher;
use crate::mcp::server_info;
use crate::service::create_mcp_service;
use crate::tools::tool_descriptors;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub has_credentials: bool,
}

pub fn router(dispatcher: Arc<Dispatcher>, cancellation_token: CancellationToken) -> Router {
    let mcp = create_mcp_service(Arc::clone(&dispatcher), cancellation_token);
    Router::new()
        .route("/", get(discovery))
        .route("/health", get(health))
        .nest_service("/mcp", mcp)
        .layer(CorsLayer::permissive())
        .with_state(dispatcher)
}

pub async fn serve(host: &str, port: u16, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let ct = CancellationToken::new();
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("huntress-mcp listening on http://{}", listener.local_addr()?);
    let shutdown = ct.clone();
    axum::serve(listener, router(dispatcher, ct))
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Interrupted; shutting down");
            shutdown.cancel();
        })
        .await?;
    Ok(())
}

async fn discovery() -> Json<Value> {
    let mut info = server_info();
    if let Some(map) = info.as_object_mut() {
        map.insert("tools".into(), serde_json::json!(tool_descriptors()));
    }
    Json(info)
}

async fn health(
    State(dispatcher): State<Arc<Dispatcher>>,
    Query(query): Query<CredentialQuery>,
) -> Json<HealthResponse> {
    let has_credentials = dispatcher.has_credentials(query.into_credentials()).await;
    Json(HealthResponse {
        status: "ok".into(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        has_credentials,
    })
}
